//! Typed, index-addressable views over list slots.
//!
//! Every edit returns a new detached list and leaves the receiver untouched.
//! Element order and any empty slots outside the edited range are carried
//! over unchanged.

mod node_list;
mod node_or_token_list;
mod separated;
mod token_list;
mod trivia_list;

pub use node_list::SyntaxList;
pub use node_or_token_list::SyntaxNodeOrTokenList;
pub use separated::SeparatedSyntaxList;
pub(crate) use separated::{insert_elements, remove_element};
pub use token_list::SyntaxTokenList;
pub use trivia_list::{SyntaxTriviaList, TriviaIter};

use crate::green::{GreenNode, Slot};
use crate::red::{SyntaxNode, plain_language};
use crate::{Language, SyntaxError, SyntaxKind, SyntaxResult};

/// A detached root for a rebuilt list, or nothing when it came out empty.
pub(crate) fn detached_list(
    kind: SyntaxKind,
    slots: Vec<Slot>,
    language: &'static dyn Language,
) -> Option<SyntaxNode> {
    if slots.is_empty() {
        return None;
    }
    Some(SyntaxNode::new_root(GreenNode::new(kind, slots), language))
}

pub(crate) fn language_of(list: Option<&SyntaxNode>) -> &'static dyn Language {
    list.map_or_else(plain_language, SyntaxNode::language)
}

/// `index` may equal `len`, as for insertion.
pub(crate) fn check_position(index: usize, len: usize) -> SyntaxResult<()> {
    if index > len {
        return Err(SyntaxError::out_of_range("index", index, len));
    }
    Ok(())
}

pub(crate) fn check_index(index: usize, len: usize) -> SyntaxResult<()> {
    if index >= len {
        return Err(SyntaxError::out_of_range("index", index, len));
    }
    Ok(())
}

/// Collects elements, rejecting absent ones as a null argument.
pub(crate) fn present<T, E: Into<Option<T>>>(
    name: &'static str,
    elements: impl IntoIterator<Item = E>,
) -> SyntaxResult<Vec<T>> {
    elements
        .into_iter()
        .map(|element| element.into().ok_or(SyntaxError::NullArgument(name)))
        .collect()
}

pub(crate) fn not_a_member(name: &str) -> SyntaxError {
    SyntaxError::contract(format!("`{name}` is not an element of this list"))
}
