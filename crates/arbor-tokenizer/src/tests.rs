use arbor_syntax::{GreenTriviaList, NodeCache, TriviaKind};

use super::*;

fn lex_with(text: &str, symbols: &[&str]) -> Vec<Token> {
    let cache = NodeCache::with_capacity_bits(4);
    let symbols: Vec<Box<str>> = symbols.iter().map(|&symbol| symbol.into()).collect();
    let mut tokenizer = Tokenizer::with_cache(text, &cache, &symbols);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token();
        let done = token.kind == EOF;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

fn lex(text: &str) -> Vec<Token> {
    lex_with(text, &[])
}

fn pieces(list: &GreenTriviaList) -> Vec<(TriviaKind, String)> {
    list.pieces().iter().map(|piece| (piece.kind(), piece.full_text())).collect()
}

fn kinds(text: &str) -> Vec<&'static str> {
    lex(text).iter().map(|token| name(token.kind).unwrap_or("?")).collect()
}

#[track_caller]
fn check_value(text: &str, expected: Option<&str>) {
    let tokens = lex(text);
    assert_eq!(tokens[0].value.as_deref(), expected, "input: {text:?}");
}

#[test]
fn trailing_trivia_stops_at_end_of_line() {
    let text = "a // note\n  b";
    let tokens = lex(text);

    assert_eq!(&text[tokens[0].range], "a");
    assert!(tokens[0].leading.is_empty());
    assert_eq!(
        pieces(&tokens[0].trailing),
        vec![
            (TriviaKind::Whitespace, " ".to_owned()),
            (TriviaKind::SingleLineComment, "// note".to_owned()),
            (TriviaKind::EndOfLine, "\n".to_owned()),
        ]
    );
    assert_eq!(&text[tokens[1].range], "b");
    assert_eq!(pieces(&tokens[1].leading), vec![(TriviaKind::Whitespace, "  ".to_owned())]);
    assert!(tokens[1].trailing.is_empty());
    assert_eq!(tokens[2].kind, EOF);
}

#[test]
fn carriage_returns_end_lines() {
    let tokens = lex("a\r\nb\rc");
    assert_eq!(pieces(&tokens[0].trailing), vec![(TriviaKind::EndOfLine, "\r\n".to_owned())]);
    assert_eq!(pieces(&tokens[1].trailing), vec![(TriviaKind::EndOfLine, "\r".to_owned())]);
}

#[test]
fn punctuation_and_keywords() {
    assert_eq!(
        kinds("class C { fn f(a, b) { return a == b != !c; } }"),
        vec![
            "CLASS_KW", "NAME", "L_BRACE", "FN_KW", "NAME", "L_PAREN", "NAME", "COMMA", "NAME",
            "R_PAREN", "L_BRACE", "RETURN_KW", "NAME", "EQ2", "NAME", "NEQ", "BANG", "NAME",
            "SEMICOLON", "R_BRACE", "R_BRACE", "EOF",
        ]
    );
    assert_eq!(kinds("x = y.z + 1 - 2 * 3 / 4 < 5 > 6"), vec![
        "NAME", "EQ", "NAME", "DOT", "NAME", "PLUS", "INT_NUMBER", "MINUS", "INT_NUMBER", "STAR",
        "INT_NUMBER", "SLASH", "INT_NUMBER", "LT", "INT_NUMBER", "GT", "INT_NUMBER", "EOF",
    ]);
}

#[test]
fn integer_values_are_decoded() {
    check_value("42", Some("42"));
    check_value("1_000", Some("1000"));
    check_value("0x1F", Some("31"));
    check_value("0b101", Some("5"));

    for text in ["0x", "12ab", "99999999999999999999"] {
        let tokens = lex(text);
        assert_eq!(tokens[0].kind, INT_NUMBER);
        assert_eq!(tokens[0].value, None, "input: {text:?}");
        let diagnostic = tokens[0].diagnostic.as_ref().unwrap();
        assert_eq!(diagnostic.code(), codes::INVALID_INTEGER);
    }
}

#[test]
fn string_values_are_unescaped() {
    check_value(r#""a\n\"b\\""#, Some("a\n\"b\\"));
    check_value(r#""""#, Some(""));

    let tokens = lex(" \"open\nx");
    assert_eq!(tokens[0].kind, STRING);
    assert_eq!(tokens[0].value.as_deref(), Some("open"));
    let diagnostic = tokens[0].diagnostic.as_ref().unwrap();
    assert_eq!(diagnostic.code(), codes::UNTERMINATED_STRING);
    assert_eq!(diagnostic.range(), TextRange::new(1.into(), 6.into()));

    let tokens = lex(r#""\q""#);
    assert_eq!(tokens[0].value.as_deref(), Some("q"));
    assert_eq!(tokens[0].diagnostic.as_ref().unwrap().code(), codes::INVALID_ESCAPE);
}

#[test]
fn comments() {
    let tokens = lex("/// doc\n/* x\n y */ a /* open");
    assert_eq!(
        pieces(&tokens[0].leading),
        vec![
            (TriviaKind::DocComment, "/// doc".to_owned()),
            (TriviaKind::EndOfLine, "\n".to_owned()),
            (TriviaKind::MultiLineComment, "/* x\n y */".to_owned()),
            (TriviaKind::Whitespace, " ".to_owned()),
        ]
    );
    let open = &tokens[0].trailing.pieces()[1];
    assert_eq!(open.kind(), TriviaKind::MultiLineComment);
    assert_eq!(open.diagnostics()[0].code(), codes::UNTERMINATED_COMMENT);

    let tokens = lex("//// not doc\n");
    assert_eq!(tokens[0].leading.pieces()[0].kind(), TriviaKind::SingleLineComment);
}

#[test]
fn unexpected_characters() {
    let tokens = lex("a @ b");
    assert_eq!(tokens[1].kind, UNKNOWN);
    assert_eq!(tokens[1].diagnostic.as_ref().unwrap().code(), codes::UNEXPECTED_CHARACTER);
}

#[test]
fn directives_are_structured_trivia() {
    let tokens = lex("  #region Some name\na");
    let leading = tokens[0].leading.pieces();
    assert_eq!(leading.len(), 2);
    assert_eq!(leading[0].kind(), TriviaKind::Whitespace);
    assert_eq!(leading[1].kind(), TriviaKind::Directive);

    let structure = leading[1].structure().unwrap();
    assert_eq!(structure.kind(), REGION_DIRECTIVE);
    assert_eq!(structure.full_text(), "#region Some name\n");
    let slot_kinds: Vec<_> = structure.slots().iter().flatten().map(|slot| slot.kind()).collect();
    assert_eq!(slot_kinds, vec![HASH, REGION_KW, DIRECTIVE_TEXT]);
    let last = structure.last_token().unwrap();
    assert_eq!(pieces(last.trailing()), vec![(TriviaKind::EndOfLine, "\n".to_owned())]);
}

#[test]
fn directives_only_start_lines() {
    let tokens = lex("a #if X\n");
    assert_eq!(tokens[1].kind, UNKNOWN);
}

#[test]
fn excluded_lines_become_disabled_text() {
    let text = "#if A\nx\n#else\ny\n#endif\n";

    let tokens = lex(text);
    assert_eq!(&text[tokens[0].range], "y");
    let leading: Vec<_> = tokens[0].leading.pieces().iter().map(|piece| piece.kind()).collect();
    assert_eq!(
        leading,
        vec![TriviaKind::Directive, TriviaKind::DisabledText, TriviaKind::Directive]
    );
    assert_eq!(tokens[0].leading.pieces()[1].text(), Some("x\n"));

    let tokens = lex_with(text, &["A"]);
    assert_eq!(&text[tokens[0].range], "x");
    let eof = &tokens[1];
    assert_eq!(eof.kind, EOF);
    assert_eq!(eof.leading.pieces()[1].text(), Some("y\n"));
}

#[test]
fn define_enables_later_groups() {
    let text = "#define A\n#if A\n  #if B\nz\n  #endif\nx\n#endif";
    let tokens = lex(text);
    assert_eq!(&text[tokens[0].range], "x");
    assert_eq!(tokens[1].kind, EOF);
    let eof_leading = tokens[1].leading.pieces();
    assert_eq!(eof_leading.len(), 1);
    assert_eq!(eof_leading[0].structure().unwrap().kind(), ENDIF_DIRECTIVE);
}

#[test]
fn unbalanced_directives_report_diagnostics() {
    let tokens = lex("#endif\n#bogus\n");
    let leading = tokens[0].leading.pieces();
    let endif = leading[0].structure().unwrap();
    assert_eq!(endif.diagnostics()[0].code(), codes::UNBALANCED_DIRECTIVE);
    let bogus = leading[1].structure().unwrap();
    assert_eq!(bogus.kind(), BAD_DIRECTIVE);
    assert_eq!(bogus.diagnostics()[0].code(), codes::BAD_DIRECTIVE);
}
