//! Immutable, lossless syntax trees in two layers.
//!
//! The green layer holds kinds, widths, text and trivia, shares identical
//! subtrees and knows nothing about positions or parents. The red layer is
//! built on demand over it and adds absolute offsets and parent links. Every
//! edit produces a new tree; unchanged green subtrees are reused.

pub mod annotation;
/// Typed wrappers over raw syntax nodes.
pub mod ast;
mod cursor;
pub mod diff;
mod edit;
mod element;
pub mod equivalence;
mod error;
pub mod green;
mod kind;
pub mod list;
pub mod red;
pub mod serialize;
mod syntax_set;
mod tracking;
pub mod visit;

pub use annotation::{Annotatable, SyntaxAnnotation};
pub use cursor::{DescendantTokens, DescendantTrivia, DescendantsWithTokens, Preorder, WalkEvent};
pub use diff::{DiffOptions, TextChange, apply_changes};
pub use edit::RemoveOptions;
pub use element::NodeOrToken;
pub use error::{SyntaxError, SyntaxResult};
pub use green::{
    GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList, NodeCache, NodeFlags, Slot,
    TriviaKind,
};
pub use kind::{DirectiveRole, Language, PlainLanguage, SyntaxKind};
pub use red::{
    ParseOptions, SourceKind, SyntaxNode, SyntaxNodeOrToken, SyntaxNodePtr, SyntaxToken,
    SyntaxTree, SyntaxTrivia,
};
pub use serialize::{DecodeError, SerializeOptions, deserialize_from, deserialize_with};
/// Compact set of `SyntaxKind` values.
pub use syntax_set::SyntaxSet;
pub use tracking::TRACKING_KIND;
