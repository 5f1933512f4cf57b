use crate::{SyntaxKind, SyntaxNode};

/// A typed view over a [`SyntaxNode`] of particular kinds.
pub trait AstNode: Clone {
    fn can_cast(kind: SyntaxKind) -> bool
    where
        Self: Sized;

    fn cast(syntax: SyntaxNode) -> Option<Self>
    where
        Self: Sized;

    fn syntax(&self) -> &SyntaxNode;
}

impl AstNode for SyntaxNode {
    fn can_cast(_kind: SyntaxKind) -> bool {
        true
    }

    fn cast(syntax: SyntaxNode) -> Option<Self> {
        Some(syntax)
    }

    fn syntax(&self) -> &SyntaxNode {
        self
    }
}
