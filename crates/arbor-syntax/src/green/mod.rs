//! The immutable, position-free layer of the tree.

mod cache;
mod flags;
mod node;
mod token;
mod trivia;

use arbor_errors::Diagnostic;
pub use cache::{CacheLookup, NodeCache};
pub use flags::NodeFlags;
pub use node::GreenNode;
use text_size::TextSize;
pub use token::GreenToken;
pub use trivia::{GreenTrivia, GreenTriviaList, TriviaContent, TriviaKind};

use crate::annotation::SyntaxAnnotation;
use crate::{NodeOrToken, SyntaxKind};

pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

/// A child position; `None` stands for an omitted element.
pub type Slot = Option<GreenElement>;

impl GreenElement {
    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.as_ref().either(GreenNode::kind, GreenToken::kind)
    }

    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.as_ref().either(GreenNode::full_width, GreenToken::full_width)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.full_width() == TextSize::new(0)
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        match self {
            Self::Node(node) => node.flags(),
            Self::Token(token) => token.flags(),
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        !self.flags().contains(NodeFlags::IS_NOT_MISSING)
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        match self {
            Self::Node(node) => node.annotations(),
            Self::Token(token) => token.annotations(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Node(node) => node.diagnostics(),
            Self::Token(token) => token.diagnostics(),
        }
    }

    #[must_use]
    pub fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        match self {
            Self::Node(node) => Self::Node(node.with_annotations(annotations)),
            Self::Token(token) => Self::Token(token.with_annotations(annotations)),
        }
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            Self::Node(node) => node.write_text(out),
            Self::Token(token) => token.write_text(out),
        }
    }

    pub fn full_text(&self) -> String {
        let mut text = String::new();
        self.write_text(&mut text);
        text
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(this), Self::Node(other)) => this.ptr_eq(other),
            (Self::Token(this), Self::Token(other)) => this.ptr_eq(other),
            _ => false,
        }
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        match self {
            Self::Node(node) => node.addr(),
            Self::Token(token) => token.addr(),
        }
    }

    /// Compares full text chunk by chunk without building either string.
    pub(crate) fn text_eq(&self, other: &Self) -> bool {
        if self.full_width() != other.full_width() {
            return false;
        }
        let (mut left, mut right) = (TextChunks::new(self), TextChunks::new(other));
        let (mut this, mut that): (&[u8], &[u8]) = (&[], &[]);
        loop {
            if this.is_empty() {
                this = left.next().map_or(&[], str::as_bytes);
            }
            if that.is_empty() {
                that = right.next().map_or(&[], str::as_bytes);
            }
            if this.is_empty() || that.is_empty() {
                return this.is_empty() && that.is_empty();
            }
            let len = this.len().min(that.len());
            if this[..len] != that[..len] {
                return false;
            }
            this = &this[len..];
            that = &that[len..];
        }
    }
}

enum Chunk<'a> {
    Element(&'a GreenElement),
    Trivia(&'a GreenTrivia),
    Text(&'a str),
}

/// Non-empty pieces of source text in order.
struct TextChunks<'a> {
    stack: Vec<Chunk<'a>>,
}

impl<'a> TextChunks<'a> {
    fn new(element: &'a GreenElement) -> Self {
        Self { stack: vec![Chunk::Element(element)] }
    }

    fn push_slots(&mut self, node: &'a GreenNode) {
        self.stack.extend(node.slots().iter().rev().flatten().map(Chunk::Element));
    }
}

impl<'a> Iterator for TextChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some(chunk) = self.stack.pop() {
            match chunk {
                Chunk::Element(NodeOrToken::Node(node)) => self.push_slots(node),
                Chunk::Element(NodeOrToken::Token(token)) => {
                    self.stack.extend(token.trailing().pieces().iter().rev().map(Chunk::Trivia));
                    self.stack.push(Chunk::Text(token.text()));
                    self.stack.extend(token.leading().pieces().iter().rev().map(Chunk::Trivia));
                }
                Chunk::Trivia(trivia) => match trivia.structure() {
                    Some(node) => self.push_slots(node),
                    None => self.stack.push(Chunk::Text(trivia.text().unwrap_or_default())),
                },
                Chunk::Text(text) if text.is_empty() => {}
                Chunk::Text(text) => return Some(text),
            }
        }
        None
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        Self::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        Self::Token(token)
    }
}

pub(crate) fn slot_ptr_eq(left: &Slot, right: &Slot) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => left.ptr_eq(right),
        _ => false,
    }
}

/// Out-of-band payload carried by a minority of green elements.
#[derive(Clone, Debug)]
pub(crate) struct GreenExtra {
    diagnostics: Box<[Diagnostic]>,
    annotations: Box<[SyntaxAnnotation]>,
}

impl GreenExtra {
    pub(crate) fn new(
        diagnostics: Vec<Diagnostic>,
        mut annotations: Vec<SyntaxAnnotation>,
    ) -> Option<Box<Self>> {
        let mut seen = rustc_hash::FxHashSet::default();
        annotations.retain(|annotation| seen.insert(annotation.id()));

        if diagnostics.is_empty() && annotations.is_empty() {
            return None;
        }
        Some(Box::new(Self {
            diagnostics: diagnostics.into_boxed_slice(),
            annotations: annotations.into_boxed_slice(),
        }))
    }

    pub(crate) fn flags(&self) -> NodeFlags {
        let mut flags = NodeFlags::NONE;
        flags.set(NodeFlags::CONTAINS_DIAGNOSTICS, !self.diagnostics.is_empty());
        flags.set(NodeFlags::CONTAINS_ANNOTATIONS, !self.annotations.is_empty());
        flags
    }

    pub(crate) fn diagnostics_of(extra: &Option<Box<Self>>) -> &[Diagnostic] {
        match extra {
            Some(extra) => &extra.diagnostics,
            None => &[],
        }
    }

    pub(crate) fn annotations_of(extra: &Option<Box<Self>>) -> &[SyntaxAnnotation] {
        match extra {
            Some(extra) => &extra.annotations,
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::PlainLanguage;

    const NAME: SyntaxKind = SyntaxKind(20);
    const PLUS: SyntaxKind = SyntaxKind(21);
    const BINARY: SyntaxKind = SyntaxKind(30);

    fn token(kind: SyntaxKind, text: &str, trailing: &str) -> GreenElement {
        let trailing = if trailing.is_empty() {
            GreenTriviaList::empty()
        } else {
            GreenTriviaList::new([GreenTrivia::new(TriviaKind::Whitespace, trailing)])
        };
        GreenToken::new(kind, text).with_trailing(trailing).into()
    }

    fn binary(left: &str, right: &str) -> GreenNode {
        GreenNode::new(
            BINARY,
            [
                Some(token(NAME, left, " ")),
                Some(token(PLUS, "+", " ")),
                Some(token(NAME, right, "")),
            ],
        )
    }

    #[test]
    fn widths_and_text() {
        let node = binary("a", "bc");
        assert_eq!(node.full_text(), "a + bc");
        assert_eq!(node.full_width(), TextSize::new(6));
        assert_eq!(node.slot_offset(2), TextSize::new(4));
        assert_eq!(node.slot_index_at(TextSize::new(1)), Some(0));
        assert_eq!(node.slot_index_at(TextSize::new(2)), Some(1));
        assert_eq!(node.slot_index_at(TextSize::new(6)), None);
        assert!(!node.is_missing());
    }

    #[test]
    fn many_children_use_prefix_offsets() {
        let list = GreenNode::list((0..10).map(|i| token(NAME, &i.to_string(), " ")));
        assert_eq!(list.slot_count(), 10);
        assert_eq!(list.slot_offset(7), TextSize::new(14));
        assert_eq!(list.slot_index_at(TextSize::new(15)), Some(7));
        assert_eq!(list.slot_index_at(TextSize::new(14)), Some(7));
        assert_eq!(list.full_text(), "0 1 2 3 4 5 6 7 8 9 ");
    }

    #[test]
    fn diagnostics_set_flags_without_touching_children() {
        let node = binary("a", "b");
        let diagnostic = Diagnostic::error(1, "bad", text_size::TextRange::empty(TextSize::new(0)));
        let with = node.with_diagnostics(vec![diagnostic.clone()]);

        assert!(with.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS));
        assert!(!node.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS));
        assert_eq!(with.diagnostics(), &[diagnostic]);
        assert!(with.slot(0).unwrap().ptr_eq(node.slot(0).unwrap()));

        let outer = GreenNode::new(BINARY, [Some(with.into())]);
        assert!(outer.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS));
    }

    #[test]
    fn missing_propagates_from_tokens() {
        let node = GreenNode::new(BINARY, [Some(GreenToken::missing(NAME).into()), None]);
        assert!(node.is_missing());
        assert_eq!(node.first_token(), None);
    }

    #[test]
    fn dump() {
        let node = GreenNode::new(BINARY, [Some(binary("a", "b").into()), None]);
        expect![[r#"
            UNKNOWN@0..5
              UNKNOWN@0..5
                UNKNOWN@0..2 "a"
                UNKNOWN@2..4 "+"
                UNKNOWN@4..5 "b"
        "#]]
        .assert_eq(&node.debug_dump(&PlainLanguage));
    }

    #[test]
    fn text_comparison_ignores_chunk_boundaries() {
        let split = GreenElement::from(binary("ab", "c"));
        let joined = token(NAME, "ab +", " c");
        assert!(split.text_eq(&joined));
        assert!(joined.text_eq(&split));

        let other = GreenElement::from(binary("ab", "d"));
        assert!(!split.text_eq(&other));
        assert!(!split.text_eq(&token(NAME, "ab + c", " ")));
        assert!(split.text_eq(&split.clone()));
    }
}
