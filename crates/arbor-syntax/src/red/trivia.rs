use std::fmt;

use arbor_errors::Diagnostic;
use text_size::{TextRange, TextSize};

use super::node::plain_language;
use super::{SyntaxNode, SyntaxToken};
use crate::green::{GreenTrivia, TriviaKind};
use crate::Language;

/// A positioned trivia piece and the token it hangs off.
#[derive(Clone)]
pub struct SyntaxTrivia {
    token: Option<SyntaxToken>,
    green: GreenTrivia,
    offset: TextSize,
    index: u32,
}

impl SyntaxTrivia {
    pub(crate) fn new(
        token: Option<SyntaxToken>,
        green: GreenTrivia,
        offset: TextSize,
        index: usize,
    ) -> Self {
        Self { token, green, offset, index: index as u32 }
    }

    pub fn detached(green: GreenTrivia) -> Self {
        Self::new(None, green, TextSize::new(0), 0)
    }

    #[inline]
    pub fn kind(&self) -> TriviaKind {
        self.green.kind()
    }

    #[inline]
    pub fn green(&self) -> &GreenTrivia {
        &self.green
    }

    pub fn token(&self) -> Option<&SyntaxToken> {
        self.token.as_ref()
    }

    /// Position among the token's trivia, counting leading pieces first.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.width())
    }

    pub fn span(&self) -> TextRange {
        self.full_span()
    }

    pub fn text(&self) -> String {
        self.green.full_text()
    }

    pub fn is_directive(&self) -> bool {
        self.kind() == TriviaKind::Directive
    }

    pub fn is_comment(&self) -> bool {
        self.kind().is_comment()
    }

    pub fn has_structure(&self) -> bool {
        self.green.has_structure()
    }

    pub fn language(&self) -> &'static dyn Language {
        self.token.as_ref().map_or_else(plain_language, SyntaxToken::language)
    }

    /// The parsed structure of this trivia as a root positioned where the trivia is.
    ///
    /// Each call builds a new root; the root keeps the enclosing tree alive
    /// through [`SyntaxNode::parent_trivia`].
    pub fn structure(&self) -> Option<SyntaxNode> {
        let green = self.green.structure()?.clone();
        let options = self.token.as_ref().and_then(|token| token.raw_parent()?.options_arc());
        Some(SyntaxNode::with_root_info(
            green,
            self.offset,
            self.language(),
            options,
            Some(self.clone()),
        ))
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let own = self.green.diagnostics().iter();
        let mut out: Vec<Diagnostic> =
            own.map(|diagnostic| diagnostic.with_range(diagnostic.range() + self.offset)).collect();
        if let Some(structure) = self.structure() {
            out.extend(structure.diagnostics());
        }
        out
    }
}

impl PartialEq for SyntaxTrivia {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
            && self.index == other.index
            && self.offset == other.offset
            && self.green.ptr_eq(&other.green)
    }
}

impl Eq for SyntaxTrivia {}

impl std::hash::Hash for SyntaxTrivia {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.token.hash(state);
        self.index.hash(state);
        self.offset.hash(state);
        self.green.addr().hash(state);
    }
}

impl fmt::Debug for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.full_span(), self.text())
    }
}

impl fmt::Display for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
