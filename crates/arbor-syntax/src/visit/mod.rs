//! Visitors, walkers and rewriters over the red tree.

mod rewriter;
mod visitor;
mod walker;

pub use rewriter::{SyntaxRewriter, rewrite, walk_list, walk_node, walk_token, walk_trivia};
pub use visitor::{SyntaxVisitor, SyntaxVisitorWithArg};
pub use walker::{SyntaxWalker, WalkDepth, walk};
