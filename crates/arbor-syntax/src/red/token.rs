use std::fmt;

use arbor_errors::Diagnostic;
use text_size::{TextRange, TextSize};

use super::node::plain_language;
use super::{SyntaxNode, SyntaxTrivia};
use crate::green::{GreenToken, GreenTrivia, GreenTriviaList, NodeFlags};
use crate::list::SyntaxTriviaList;
use crate::{Language, NodeOrToken, SyntaxKind};

/// A positioned token. Tokens are not cached, so two handles are equal when
/// they name the same green token at the same place in the same holder.
#[derive(Clone)]
pub struct SyntaxToken {
    parent: Option<SyntaxNode>,
    green: GreenToken,
    offset: TextSize,
    index: u32,
}

impl SyntaxToken {
    pub(crate) fn new(
        parent: Option<SyntaxNode>,
        green: GreenToken,
        offset: TextSize,
        index: usize,
    ) -> Self {
        Self { parent, green, offset, index: index as u32 }
    }

    /// A token that belongs to no tree, positioned at zero.
    pub fn detached(green: GreenToken) -> Self {
        Self::new(None, green, TextSize::new(0), 0)
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    #[inline]
    pub fn green(&self) -> &GreenToken {
        &self.green
    }

    #[inline]
    pub fn offset(&self) -> TextSize {
        self.offset
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    pub fn span(&self) -> TextRange {
        TextRange::at(self.offset + self.green.leading().width(), self.green.width())
    }

    /// Token text without trivia.
    #[inline]
    pub fn text(&self) -> &str {
        self.green.text()
    }

    pub fn value_text(&self) -> &str {
        self.green.value_text()
    }

    pub fn full_text(&self) -> String {
        self.green.full_text()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.green.is_missing()
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.green.flags()
    }

    pub fn language(&self) -> &'static dyn Language {
        self.parent.as_ref().map_or_else(plain_language, SyntaxNode::language)
    }

    /// The immediate holder, which may be a list.
    pub(crate) fn raw_parent(&self) -> Option<&SyntaxNode> {
        self.parent.as_ref()
    }

    /// The node holding this token, looking through lists.
    pub fn parent(&self) -> Option<SyntaxNode> {
        let parent = self.parent.as_ref()?;
        if parent.is_list() { parent.parent() } else { Some(parent.clone()) }
    }

    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.parent().into_iter().flat_map(|parent| parent.ancestors())
    }

    pub fn leading_trivia(&self) -> SyntaxTriviaList {
        SyntaxTriviaList::new(Some(self.clone()), self.green.leading().clone(), self.offset, 0)
    }

    pub fn trailing_trivia(&self) -> SyntaxTriviaList {
        let leading = self.green.leading();
        SyntaxTriviaList::new(
            Some(self.clone()),
            self.green.trailing().clone(),
            self.span().end(),
            leading.len(),
        )
    }

    pub fn has_leading_trivia(&self) -> bool {
        !self.green.leading().is_empty()
    }

    pub fn has_trailing_trivia(&self) -> bool {
        !self.green.trailing().is_empty()
    }

    /// The trivia piece of this token covering `position`.
    pub fn trivia_at(&self, position: TextSize) -> Option<SyntaxTrivia> {
        let span = self.span();
        let list = if position < span.start() {
            self.leading_trivia()
        } else if position >= span.end() {
            self.trailing_trivia()
        } else {
            return None;
        };
        list.iter().find(|trivia| trivia.full_span().contains(position))
    }

    /// The next token with a non-zero width, crossing node boundaries.
    pub fn next_token(&self) -> Option<Self> {
        self.next_token_where(|token| token.green.width() != TextSize::new(0))
    }

    pub fn next_token_including_empty(&self) -> Option<Self> {
        self.next_token_where(|_| true)
    }

    pub fn prev_token(&self) -> Option<Self> {
        self.prev_token_where(|token| token.green.width() != TextSize::new(0))
    }

    pub fn prev_token_including_empty(&self) -> Option<Self> {
        self.prev_token_where(|_| true)
    }

    fn next_token_where(&self, predicate: impl Fn(&Self) -> bool) -> Option<Self> {
        let mut holder = self.parent.clone()?;
        let mut slot = self.index() + 1;
        loop {
            for index in slot..holder.slot_count() {
                match holder.slot(index) {
                    Some(NodeOrToken::Token(token)) if predicate(&token) => return Some(token),
                    Some(NodeOrToken::Node(node)) => {
                        if let Some(token) = node.first_token_where(&predicate) {
                            return Some(token);
                        }
                    }
                    _ => {}
                }
            }
            slot = holder.index() + 1;
            holder = holder.raw_parent()?;
        }
    }

    fn prev_token_where(&self, predicate: impl Fn(&Self) -> bool) -> Option<Self> {
        let mut holder = self.parent.clone()?;
        let mut slot = self.index();
        loop {
            for index in (0..slot).rev() {
                match holder.slot(index) {
                    Some(NodeOrToken::Token(token)) if predicate(&token) => return Some(token),
                    Some(NodeOrToken::Node(node)) => {
                        if let Some(token) = node.last_token_where(&predicate) {
                            return Some(token);
                        }
                    }
                    _ => {}
                }
            }
            slot = holder.index();
            holder = holder.raw_parent()?;
        }
    }

    /// Diagnostics on this token and its trivia, with absolute ranges. Ranges stored on the
    /// green token are relative to the start of its leading trivia.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = Vec::new();
        if !self.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS) {
            return out;
        }
        for trivia in self.leading_trivia().iter() {
            out.extend(trivia.diagnostics());
        }
        let start = self.offset;
        out.extend(self.green.diagnostics().iter().map(|d| d.with_range(d.range() + start)));
        for trivia in self.trailing_trivia().iter() {
            out.extend(trivia.diagnostics());
        }
        out
    }

    /// A detached copy of this token with different leading trivia.
    pub fn with_leading_trivia(&self, trivia: impl IntoIterator<Item = GreenTrivia>) -> Self {
        Self::detached(self.green.with_leading(GreenTriviaList::new(trivia)))
    }

    /// A detached copy of this token with different trailing trivia.
    pub fn with_trailing_trivia(&self, trivia: impl IntoIterator<Item = GreenTrivia>) -> Self {
        Self::detached(self.green.with_trailing(GreenTriviaList::new(trivia)))
    }

    pub(crate) fn addr(&self) -> usize {
        self.green.addr()
    }
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        let same_parent = match (&self.parent, &other.parent) {
            (None, None) => true,
            (Some(this), Some(other)) => this.ptr_eq(other),
            _ => false,
        };
        same_parent
            && self.index == other.index
            && self.offset == other.offset
            && self.green.ptr_eq(&other.green)
    }
}

impl Eq for SyntaxToken {}

impl std::hash::Hash for SyntaxToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parent.as_ref().map(SyntaxNode::addr).hash(state);
        self.index.hash(state);
        self.offset.hash(state);
        self.green.addr().hash(state);
    }
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?} {:?}", self.language().kind_name(self.kind()), self.span(), self.text())
    }
}

impl fmt::Display for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}
