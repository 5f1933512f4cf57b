//! Positioned nodes, tokens and trivia built lazily over the green tree.

mod children;
mod node;
mod ptr;
mod token;
mod tree;
mod trivia;

use text_size::{TextRange, TextSize};

pub use children::{ChildIter, ChildSyntaxList};
pub(crate) use node::plain_language;
pub use node::SyntaxNode;
pub use ptr::SyntaxNodePtr;
pub use token::SyntaxToken;
pub use tree::{ParseOptions, SourceKind, SyntaxTree};
pub use trivia::SyntaxTrivia;

use crate::green::{GreenElement, NodeFlags};
use crate::list::SyntaxTriviaList;
use crate::{Language, NodeOrToken, SyntaxKind};

pub type SyntaxNodeOrToken = NodeOrToken<SyntaxNode, SyntaxToken>;

impl SyntaxNodeOrToken {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Node(node) => node.kind(),
            Self::Token(token) => token.kind(),
        }
    }

    pub fn green(&self) -> GreenElement {
        match self {
            Self::Node(node) => NodeOrToken::Node(node.green().clone()),
            Self::Token(token) => NodeOrToken::Token(token.green().clone()),
        }
    }

    pub fn offset(&self) -> TextSize {
        match self {
            Self::Node(node) => node.offset(),
            Self::Token(token) => token.offset(),
        }
    }

    pub fn full_span(&self) -> TextRange {
        match self {
            Self::Node(node) => node.full_span(),
            Self::Token(token) => token.full_span(),
        }
    }

    pub fn span(&self) -> TextRange {
        match self {
            Self::Node(node) => node.span(),
            Self::Token(token) => token.span(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Node(node) => node.index(),
            Self::Token(token) => token.index(),
        }
    }

    pub fn flags(&self) -> NodeFlags {
        match self {
            Self::Node(node) => node.flags(),
            Self::Token(token) => token.flags(),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Self::Node(node) => node.is_missing(),
            Self::Token(token) => token.is_missing(),
        }
    }

    pub fn language(&self) -> &'static dyn Language {
        match self {
            Self::Node(node) => node.language(),
            Self::Token(token) => token.language(),
        }
    }

    /// The holding node, looking through lists.
    pub fn parent(&self) -> Option<SyntaxNode> {
        match self {
            Self::Node(node) => node.parent(),
            Self::Token(token) => token.parent(),
        }
    }

    pub(crate) fn raw_parent(&self) -> Option<SyntaxNode> {
        match self {
            Self::Node(node) => node.raw_parent(),
            Self::Token(token) => token.raw_parent().cloned(),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Node(node) => node.text(),
            Self::Token(token) => token.full_text(),
        }
    }

    pub fn leading_trivia(&self) -> SyntaxTriviaList {
        match self {
            Self::Node(node) => node.leading_trivia(),
            Self::Token(token) => token.leading_trivia(),
        }
    }

    pub fn trailing_trivia(&self) -> SyntaxTriviaList {
        match self {
            Self::Node(node) => node.trailing_trivia(),
            Self::Token(token) => token.trailing_trivia(),
        }
    }
}

impl From<SyntaxNode> for SyntaxNodeOrToken {
    fn from(node: SyntaxNode) -> Self {
        Self::Node(node)
    }
}

impl From<SyntaxToken> for SyntaxNodeOrToken {
    fn from(token: SyntaxToken) -> Self {
        Self::Token(token)
    }
}

impl std::fmt::Display for SyntaxNodeOrToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(node) => std::fmt::Display::fmt(node, f),
            Self::Token(token) => std::fmt::Display::fmt(token, f),
        }
    }
}
