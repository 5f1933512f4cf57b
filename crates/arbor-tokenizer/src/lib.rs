//! Tokenizer for the curly-brace test language.
//!
//! Each token carries the trivia around it: trailing trivia runs up to and
//! including the first end of line, everything else leads the next token.
//! Preprocessor directives are only recognized at the start of a line and
//! become structured trivia; lines excluded by `#if`/`#else` become disabled
//! text.

mod cursor;
pub mod kinds;

use arbor_errors::Diagnostic;
use arbor_syntax::{
    GreenElement, GreenToken, GreenTrivia, GreenTriviaList, NodeCache, SyntaxKind, TriviaKind,
};
use cursor::Cursor;
use kinds::*;
use text_size::{TextRange, TextSize};

/// Diagnostic codes reported while tokenizing.
pub mod codes {
    pub const UNEXPECTED_CHARACTER: u32 = 1;
    pub const UNTERMINATED_STRING: u32 = 2;
    pub const INVALID_ESCAPE: u32 = 3;
    pub const INVALID_INTEGER: u32 = 4;
    pub const UNTERMINATED_COMMENT: u32 = 5;
    pub const BAD_DIRECTIVE: u32 = 6;
    pub const UNBALANCED_DIRECTIVE: u32 = 7;
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: SyntaxKind,
    /// Range of the token text, without trivia.
    pub range: TextRange,
    pub leading: GreenTriviaList,
    pub trailing: GreenTriviaList,
    /// Decoded value of a literal.
    pub value: Option<Box<str>>,
    /// A problem with the token text, relative to the start of the leading trivia.
    pub diagnostic: Option<Diagnostic>,
}

impl Token {
    fn eof() -> Self {
        Self {
            kind: EOF,
            range: TextRange::empty(TextSize::new(0)),
            leading: GreenTriviaList::empty(),
            trailing: GreenTriviaList::empty(),
            value: None,
            diagnostic: None,
        }
    }
}

struct Lexeme {
    kind: SyntaxKind,
    value: Option<Box<str>>,
    error: Option<(u32, &'static str)>,
}

impl Lexeme {
    fn new(kind: SyntaxKind) -> Self {
        Self { kind, value: None, error: None }
    }
}

/// An open `#if` group.
struct Condition {
    parent_active: bool,
    taken: bool,
    active: bool,
}

pub struct Tokenizer<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    cache: &'a NodeCache,
    current: Token,
    pieces: Vec<GreenTrivia>,
    line_start: bool,
    symbols: Vec<Box<str>>,
    conditions: Vec<Condition>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_cache(text, NodeCache::shared(), &[])
    }

    /// A tokenizer that interns through `cache` and starts with `symbols` defined.
    pub fn with_cache(text: &'a str, cache: &'a NodeCache, symbols: &[Box<str>]) -> Self {
        let mut tokenizer = Self {
            text,
            cursor: Cursor::new(text),
            cache,
            current: Token::eof(),
            pieces: Vec::with_capacity(4),
            line_start: true,
            symbols: symbols.to_vec(),
            conditions: Vec::new(),
        };
        tokenizer.next_token();
        tokenizer
    }

    pub fn peek(&self) -> &Token {
        &self.current
    }

    /// Returns the current token and moves to the next one.
    pub fn next_token(&mut self) -> Token {
        self.trivia(false);
        let leading: GreenTriviaList = self.pieces.drain(..).collect();
        let lexeme = self.lexeme();
        let range = self.range();
        self.cursor.reset_pos_within_token();
        self.line_start = false;
        self.trivia(true);
        let trailing: GreenTriviaList = self.pieces.drain(..).collect();

        let diagnostic = lexeme.error.map(|(code, message)| {
            Diagnostic::error(code, message, TextRange::at(leading.width(), range.len()))
        });
        let token = Token {
            kind: lexeme.kind,
            range,
            leading,
            trailing,
            value: lexeme.value,
            diagnostic,
        };
        std::mem::replace(&mut self.current, token)
    }

    /// Builds the green token for `token`, interned when it is plain.
    pub fn green(&self, token: Token) -> GreenToken {
        let text = &self.text[token.range];
        let mut green = self.cache.token(token.kind, text, token.leading, token.trailing);
        if let Some(value) = token.value {
            green = green.with_value(value);
        }
        if let Some(diagnostic) = token.diagnostic {
            green = green.with_diagnostics(vec![diagnostic]);
        }
        green
    }

    fn offset(&self) -> TextSize {
        TextSize::of(self.text) - self.cursor.remaining()
    }

    fn range(&self) -> TextRange {
        let end = self.offset();
        TextRange::new(end - self.cursor.pos_within_token(), end)
    }

    fn token_text(&self) -> &'a str {
        let text = self.text;
        &text[self.range()]
    }

    fn push_piece(&mut self, kind: TriviaKind) {
        let piece = self.cache.trivia(kind, self.token_text());
        self.cursor.reset_pos_within_token();
        self.pieces.push(piece);
    }

    fn active(&self) -> bool {
        self.conditions.last().is_none_or(|condition| condition.active)
    }

    fn trivia(&mut self, trailing: bool) {
        loop {
            if !trailing && self.line_start && !self.cursor.is_eof() {
                if !self.active() && !line_starts_directive(self.cursor.rest()) {
                    self.disabled_text();
                    continue;
                }
                if self.cursor.matches('#') {
                    let directive = self.directive();
                    self.pieces.push(directive);
                    continue;
                }
            }

            match self.cursor.peek() {
                ' ' | '\t' | '\u{c}' => {
                    self.cursor.advance_while(is_space);
                    self.push_piece(TriviaKind::Whitespace);
                }
                '\n' | '\r' => {
                    self.end_of_line();
                    self.push_piece(TriviaKind::EndOfLine);
                    if trailing {
                        return;
                    }
                }
                '/' if self.cursor.second() == '/' => {
                    let doc = self.cursor.rest().starts_with("///")
                        && !self.cursor.rest().starts_with("////");
                    self.cursor.advance_while(|c| !matches!(c, '\n' | '\r'));
                    self.line_start = false;
                    let kind =
                        if doc { TriviaKind::DocComment } else { TriviaKind::SingleLineComment };
                    self.push_piece(kind);
                }
                '/' if self.cursor.second() == '*' => self.block_comment(),
                _ => return,
            }
        }
    }

    fn end_of_line(&mut self) {
        if !self.cursor.eat('\r') || self.cursor.matches('\n') {
            self.cursor.eat('\n');
        }
        self.line_start = true;
    }

    fn block_comment(&mut self) {
        self.cursor.advance();
        self.cursor.advance();
        let mut terminated = false;
        while !self.cursor.is_eof() {
            if self.cursor.peek() == '*' && self.cursor.second() == '/' {
                self.cursor.advance();
                self.cursor.advance();
                terminated = true;
                break;
            }
            self.cursor.advance();
        }
        self.line_start = false;

        let width = self.cursor.pos_within_token();
        let mut piece = GreenTrivia::new(TriviaKind::MultiLineComment, self.token_text());
        if !terminated {
            piece = piece.with_diagnostics(vec![Diagnostic::error(
                codes::UNTERMINATED_COMMENT,
                "unterminated block comment",
                TextRange::up_to(width),
            )]);
        }
        self.cursor.reset_pos_within_token();
        self.pieces.push(piece);
    }

    /// Consumes whole lines up to the next directive line or the end of input.
    fn disabled_text(&mut self) {
        loop {
            self.cursor.advance_while(|c| !matches!(c, '\n' | '\r'));
            if self.cursor.is_eof() {
                break;
            }
            self.end_of_line();
            if self.cursor.is_eof() || line_starts_directive(self.cursor.rest()) {
                break;
            }
        }
        self.push_piece(TriviaKind::DisabledText);
        self.line_start = true;
    }

    fn directive(&mut self) -> GreenTrivia {
        self.cursor.advance();
        let hash = self.directive_token(HASH);

        self.cursor.advance_while(|c| c.is_ascii_alphabetic());
        let word = self.token_text();
        let (node_kind, keyword_kind) = match word {
            "if" => (IF_DIRECTIVE, IF_KW),
            "else" => (ELSE_DIRECTIVE, ELSE_KW),
            "endif" => (ENDIF_DIRECTIVE, ENDIF_KW),
            "define" => (DEFINE_DIRECTIVE, DEFINE_KW),
            "region" => (REGION_DIRECTIVE, REGION_KW),
            "endregion" => (ENDREGION_DIRECTIVE, ENDREGION_KW),
            _ => (BAD_DIRECTIVE, NAME),
        };
        let keyword = (!word.is_empty()).then(|| self.directive_token(keyword_kind));

        self.cursor.advance_while(|c| !matches!(c, '\n' | '\r'));
        let argument = self.token_text();
        let text = (!argument.is_empty()).then(|| self.directive_token(DIRECTIVE_TEXT));

        let mut slots = vec![Some(hash), keyword, text];
        if matches!(self.cursor.peek(), '\n' | '\r') {
            self.end_of_line();
            let eol = self.cache.trivia(TriviaKind::EndOfLine, self.token_text());
            self.cursor.reset_pos_within_token();
            if let Some(last) = slots.iter_mut().rev().find_map(Option::as_mut) {
                *last = last.with_trailing(last.trailing().concat(&GreenTriviaList::new([eol])));
            }
        }
        self.line_start = true;

        let error = self.apply_directive(node_kind, argument.trim());
        let slots = slots.into_iter().map(|slot| slot.map(GreenElement::from)).collect();
        let mut node = self.cache.node(node_kind, slots);
        if let Some((code, message)) = error {
            let range = TextRange::at(TextSize::new(0), node.width());
            node = node.with_diagnostics(vec![Diagnostic::error(code, message, range)]);
        }
        GreenTrivia::structured(TriviaKind::Directive, node)
    }

    /// A directive token from the text scanned so far, with the spaces after it as trailing trivia.
    fn directive_token(&mut self, kind: SyntaxKind) -> GreenToken {
        let text = self.token_text();
        self.cursor.reset_pos_within_token();
        self.cursor.advance_while(is_space);
        let trailing = if self.cursor.pos_within_token() == TextSize::new(0) {
            GreenTriviaList::empty()
        } else {
            GreenTriviaList::new([self.cache.trivia(TriviaKind::Whitespace, self.token_text())])
        };
        self.cursor.reset_pos_within_token();
        self.cache.token(kind, text, GreenTriviaList::empty(), trailing)
    }

    fn apply_directive(
        &mut self,
        kind: SyntaxKind,
        argument: &str,
    ) -> Option<(u32, &'static str)> {
        match kind {
            IF_DIRECTIVE => {
                if argument.is_empty() {
                    return Some((codes::BAD_DIRECTIVE, "expected a symbol"));
                }
                let parent_active = self.active();
                let active = parent_active && self.symbols.iter().any(|s| &**s == argument);
                self.conditions.push(Condition { parent_active, taken: active, active });
            }
            ELSE_DIRECTIVE => match self.conditions.last_mut() {
                Some(condition) => {
                    condition.active = condition.parent_active && !condition.taken;
                    condition.taken = true;
                }
                None => return Some((codes::UNBALANCED_DIRECTIVE, "#else without #if")),
            },
            ENDIF_DIRECTIVE => {
                if self.conditions.pop().is_none() {
                    return Some((codes::UNBALANCED_DIRECTIVE, "#endif without #if"));
                }
            }
            DEFINE_DIRECTIVE => {
                if argument.is_empty() {
                    return Some((codes::BAD_DIRECTIVE, "expected a symbol"));
                }
                if self.active() {
                    self.symbols.push(argument.into());
                }
            }
            BAD_DIRECTIVE => return Some((codes::BAD_DIRECTIVE, "unknown directive")),
            _ => {}
        }
        None
    }

    fn lexeme(&mut self) -> Lexeme {
        if self.cursor.is_eof() {
            return Lexeme::new(EOF);
        }
        let kind = match self.cursor.advance() {
            '(' => L_PAREN,
            ')' => R_PAREN,
            '{' => L_BRACE,
            '}' => R_BRACE,
            ';' => SEMICOLON,
            ',' => COMMA,
            '.' => DOT,
            '=' if self.cursor.eat('=') => EQ2,
            '=' => EQ,
            '!' if self.cursor.eat('=') => NEQ,
            '!' => BANG,
            '<' => LT,
            '>' => GT,
            '+' => PLUS,
            '-' => MINUS,
            '*' => STAR,
            '/' => SLASH,
            '"' => return self.string(),
            first @ '0'..='9' => return self.number(first),
            'A'..='Z' | 'a'..='z' | '_' => {
                self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
                keyword(self.token_text()).unwrap_or(NAME)
            }
            _ => {
                return Lexeme {
                    error: Some((codes::UNEXPECTED_CHARACTER, "unexpected character")),
                    ..Lexeme::new(UNKNOWN)
                };
            }
        };
        Lexeme::new(kind)
    }

    fn number(&mut self, first: char) -> Lexeme {
        let radix = match (first, self.cursor.peek()) {
            ('0', 'x' | 'X') => 16,
            ('0', 'b' | 'B') => 2,
            _ => 10,
        };
        if radix != 10 {
            self.cursor.advance();
        }
        self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');

        let text = self.token_text();
        let digits = if radix == 10 { text } else { &text[2..] };
        let digits: String = digits.chars().filter(|&c| c != '_').collect();
        match u64::from_str_radix(&digits, radix) {
            Ok(value) => {
                Lexeme { value: Some(value.to_string().into()), ..Lexeme::new(INT_NUMBER) }
            }
            Err(_) => Lexeme {
                error: Some((codes::INVALID_INTEGER, "invalid integer literal")),
                ..Lexeme::new(INT_NUMBER)
            },
        }
    }

    fn string(&mut self) -> Lexeme {
        let mut value = String::new();
        let mut error = None;
        loop {
            if self.cursor.is_eof() || matches!(self.cursor.peek(), '\n' | '\r') {
                error = Some((codes::UNTERMINATED_STRING, "unterminated string literal"));
                break;
            }
            match self.cursor.advance() {
                '"' => break,
                '\\' if !self.cursor.is_eof() && !matches!(self.cursor.peek(), '\n' | '\r') => {
                    let escaped = match self.cursor.advance() {
                        'n' => '\n',
                        't' => '\t',
                        '0' => '\0',
                        '\\' => '\\',
                        '"' => '"',
                        other => {
                            error.get_or_insert((codes::INVALID_ESCAPE, "invalid escape sequence"));
                            other
                        }
                    };
                    value.push(escaped);
                }
                c => value.push(c),
            }
        }
        Lexeme { kind: STRING, value: Some(value.into()), error }
    }
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

fn line_starts_directive(rest: &str) -> bool {
    rest.trim_start_matches(is_space).starts_with('#')
}

#[cfg(test)]
mod tests;
