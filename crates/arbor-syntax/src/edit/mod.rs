//! Tree edits: replacement, insertion and removal. Each edit is a single
//! rewrite of the receiver and returns a new root that keeps the receiver's
//! language and parse options.

mod remove;
mod replace;

pub use remove::RemoveOptions;

use rustc_hash::FxHashSet;
use text_size::{TextRange, TextSize};

use crate::{SyntaxNode, SyntaxToken, SyntaxTrivia};

/// Names one element of one tree. Red nodes inside structured trivia are
/// rebuilt on every access, so identity is the green element plus where it
/// sits rather than the red handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct ElementKey {
    addr: usize,
    offset: TextSize,
    index: usize,
}

impl ElementKey {
    pub(crate) fn node(node: &SyntaxNode) -> Self {
        Self { addr: node.green().addr(), offset: node.offset(), index: node.index() }
    }

    pub(crate) fn token(token: &SyntaxToken) -> Self {
        Self { addr: token.green().addr(), offset: token.offset(), index: token.index() }
    }

    pub(crate) fn trivia(trivia: &SyntaxTrivia) -> Self {
        Self { addr: trivia.green().addr(), offset: trivia.offset(), index: trivia.index() }
    }
}

/// The elements an edit is after, and the text they cover.
#[derive(Default)]
pub(crate) struct Targets {
    keys: FxHashSet<ElementKey>,
    spans: Vec<TextRange>,
    total: Option<TextRange>,
    structured: bool,
}

impl Targets {
    pub(crate) fn add_node(&mut self, node: &SyntaxNode) {
        self.add(ElementKey::node(node), node.full_span(), node.is_part_of_structured_trivia());
    }

    pub(crate) fn add_token(&mut self, token: &SyntaxToken) {
        let structured =
            token.raw_parent().is_some_and(SyntaxNode::is_part_of_structured_trivia);
        self.add(ElementKey::token(token), token.full_span(), structured);
    }

    pub(crate) fn add_trivia(&mut self, trivia: &SyntaxTrivia) {
        let structured = trivia
            .token()
            .and_then(SyntaxToken::raw_parent)
            .is_some_and(SyntaxNode::is_part_of_structured_trivia);
        self.add(ElementKey::trivia(trivia), trivia.full_span(), structured);
    }

    fn add(&mut self, key: ElementKey, span: TextRange, structured: bool) {
        if self.keys.insert(key) {
            self.spans.push(span);
            self.total = Some(self.total.map_or(span, |total| total.cover(span)));
        }
        self.structured |= structured;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn contains(&self, key: &ElementKey) -> bool {
        self.keys.contains(key)
    }

    pub(crate) fn visits_structured_trivia(&self) -> bool {
        self.structured
    }

    /// Whether anything under `span` may be a target.
    pub(crate) fn should_visit(&self, span: TextRange) -> bool {
        let Some(total) = self.total else {
            return false;
        };
        total.intersect(span).is_some()
            && self.spans.iter().any(|target| target.intersect(span).is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList, TriviaKind};
    use crate::{PlainLanguage, SyntaxError, SyntaxKind, SyntaxNode, SyntaxToken};

    const WORD: SyntaxKind = SyntaxKind(40);
    const DOT: SyntaxKind = SyntaxKind(41);
    const ITEM: SyntaxKind = SyntaxKind(42);

    fn word(text: &str) -> GreenToken {
        let space = GreenTrivia::new(TriviaKind::Whitespace, " ");
        GreenToken::new(WORD, text).with_trailing(GreenTriviaList::new([space]))
    }

    /// `a b .` with the words in a token list.
    fn item() -> SyntaxNode {
        let words = [Some(word("a").into()), Some(word("b").into())];
        let words = GreenNode::new(SyntaxKind::LIST, words);
        let dot = GreenToken::new(DOT, ".");
        SyntaxNode::new_root(
            GreenNode::new(ITEM, [Some(words.into()), Some(dot.into())]),
            &PlainLanguage,
        )
    }

    #[track_caller]
    fn token(root: &SyntaxNode, text: &str) -> SyntaxToken {
        root.descendant_tokens().find(|token| token.text() == text).unwrap()
    }

    #[test]
    fn tokens_are_inserted_around_list_members() {
        let root = item();
        let x = SyntaxToken::detached(word("x"));

        let before = root.insert_tokens_before(&token(&root, "b"), [x.clone()]).unwrap();
        assert_eq!(before.text(), "a x b .");
        let after = root.insert_tokens_after(&token(&root, "b"), [x.clone(), x.clone()]).unwrap();
        assert_eq!(after.text(), "a b x x .");
        assert!(after.is_root());

        let err = root.insert_tokens_after(&token(&root, "."), [x]).unwrap_err();
        assert!(matches!(err, SyntaxError::Contract(_)));
    }

    #[test]
    fn trivia_is_inserted_after_a_piece() {
        let root = item();
        let space = root
            .descendant_trivia(false)
            .find(|trivia| trivia.kind() == TriviaKind::Whitespace)
            .unwrap();
        let comment = GreenTrivia::new(TriviaKind::MultiLineComment, "/* c */");
        let new = root.insert_trivia_after(&space, [comment]).unwrap();
        assert_eq!(new.text(), "a /* c */b .");
        assert_eq!(root.text(), "a b .");
    }
}
