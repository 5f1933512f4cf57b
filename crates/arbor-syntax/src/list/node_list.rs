use std::fmt;
use std::marker::PhantomData;

use text_size::{TextRange, TextSize};

use super::{check_index, check_position, detached_list, language_of, not_a_member, present};
use crate::ast::AstNode;
use crate::green::{GreenNode, Slot};
use crate::{NodeOrToken, SyntaxError, SyntaxKind, SyntaxNode, SyntaxResult};

/// A list of nodes held in one list slot.
pub struct SyntaxList<T = SyntaxNode> {
    list: Option<SyntaxNode>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AstNode> SyntaxList<T> {
    pub fn empty() -> Self {
        Self { list: None, _marker: PhantomData }
    }

    /// Wraps a list node, typically `parent.slot_node(i)`.
    pub fn from_list_node(list: Option<SyntaxNode>) -> Self {
        Self { list, _marker: PhantomData }
    }

    /// A detached list over `nodes`. An absent node is a null argument.
    pub fn create<E: Into<Option<T>>>(nodes: impl IntoIterator<Item = E>) -> SyntaxResult<Self> {
        Self::empty().add_range(nodes)
    }

    pub fn list_node(&self) -> Option<&SyntaxNode> {
        self.list.as_ref()
    }

    pub fn green(&self) -> Option<&GreenNode> {
        self.list.as_ref().map(SyntaxNode::green)
    }

    pub fn len(&self) -> usize {
        self.list.as_ref().map_or(0, SyntaxNode::slot_count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> SyntaxResult<T> {
        check_index(index, self.len())?;
        self.element(index)
            .ok_or_else(|| SyntaxError::structure("list element is not of the expected kind"))
    }

    fn element(&self, index: usize) -> Option<T> {
        self.list.as_ref()?.slot_node(index).and_then(T::cast)
    }

    pub fn first(&self) -> Option<T> {
        self.element(0)
    }

    pub fn last(&self) -> Option<T> {
        self.element(self.len().checked_sub(1)?)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + '_ {
        (0..self.len()).filter_map(|index| self.element(index))
    }

    pub fn reverse(&self) -> impl Iterator<Item = T> + '_ {
        self.iter().rev()
    }

    pub fn any(&self) -> bool {
        !self.is_empty()
    }

    pub fn any_kind(&self, kind: SyntaxKind) -> bool {
        self.index_of_kind(kind).is_some()
    }

    pub fn index_of(&self, node: &T) -> Option<usize> {
        (0..self.len()).find(|&index| self.is_at(index, node))
    }

    pub fn last_index_of(&self, node: &T) -> Option<usize> {
        (0..self.len()).rev().find(|&index| self.is_at(index, node))
    }

    fn is_at(&self, index: usize, node: &T) -> bool {
        let element = self.list.as_ref().and_then(|list| list.slot_node(index));
        element.as_ref() == Some(node.syntax())
    }

    pub fn index_of_kind(&self, kind: SyntaxKind) -> Option<usize> {
        let list = self.list.as_ref()?;
        list.green().slots().iter().position(|slot| slot.as_ref().is_some_and(|e| e.kind() == kind))
    }

    pub fn full_span(&self) -> TextRange {
        self.list.as_ref().map_or(TextRange::empty(TextSize::new(0)), SyntaxNode::full_span)
    }

    pub fn span(&self) -> TextRange {
        self.list.as_ref().map_or(TextRange::empty(TextSize::new(0)), SyntaxNode::span)
    }

    pub fn text(&self) -> String {
        self.list.as_ref().map(SyntaxNode::text).unwrap_or_default()
    }

    fn slots(&self) -> Vec<Slot> {
        self.green().map(|green| green.slots().to_vec()).unwrap_or_default()
    }

    fn rebuild(&self, slots: Vec<Slot>, new: &[T]) -> Self {
        let language = match &self.list {
            Some(list) => list.language(),
            None => language_of(new.first().map(T::syntax)),
        };
        Self::from_list_node(detached_list(SyntaxKind::LIST, slots, language))
    }

    pub fn add(&self, node: impl Into<Option<T>>) -> SyntaxResult<Self> {
        self.insert(self.len(), node)
    }

    pub fn add_range<E: Into<Option<T>>>(
        &self,
        nodes: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        self.insert_range(self.len(), nodes)
    }

    pub fn insert(&self, index: usize, node: impl Into<Option<T>>) -> SyntaxResult<Self> {
        let node = node.into().ok_or(SyntaxError::NullArgument("node"))?;
        self.insert_range(index, [node])
    }

    pub fn insert_range<E: Into<Option<T>>>(
        &self,
        index: usize,
        nodes: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        check_position(index, self.len())?;
        let nodes = present("nodes", nodes)?;
        if nodes.is_empty() {
            return Ok(self.clone());
        }
        let mut slots = self.slots();
        slots.splice(index..index, nodes.iter().map(green_slot));
        Ok(self.rebuild(slots, &nodes))
    }

    pub fn remove_at(&self, index: usize) -> SyntaxResult<Self> {
        check_index(index, self.len())?;
        let mut slots = self.slots();
        slots.remove(index);
        Ok(self.rebuild(slots, &[]))
    }

    pub fn remove(&self, node: &T) -> SyntaxResult<Self> {
        let index = self.index_of(node).ok_or_else(|| not_a_member("node"))?;
        self.remove_at(index)
    }

    pub fn replace(&self, node_in_list: &T, new_node: impl Into<Option<T>>) -> SyntaxResult<Self> {
        let new_node = new_node.into().ok_or(SyntaxError::NullArgument("new_node"))?;
        self.replace_range(node_in_list, [new_node])
    }

    pub fn replace_range<E: Into<Option<T>>>(
        &self,
        node_in_list: &T,
        new_nodes: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        let new_nodes = present("new_nodes", new_nodes)?;
        let index = self.index_of(node_in_list).ok_or_else(|| not_a_member("node_in_list"))?;
        let mut slots = self.slots();
        slots.splice(index..=index, new_nodes.iter().map(green_slot));
        Ok(self.rebuild(slots, &new_nodes))
    }
}

fn green_slot<T: AstNode>(node: &T) -> Slot {
    Some(NodeOrToken::Node(node.syntax().green().clone()))
}

impl<T> Clone for SyntaxList<T> {
    fn clone(&self) -> Self {
        Self { list: self.list.clone(), _marker: PhantomData }
    }
}

impl<T> Default for SyntaxList<T> {
    fn default() -> Self {
        Self { list: None, _marker: PhantomData }
    }
}

impl<T> PartialEq for SyntaxList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl<T> Eq for SyntaxList<T> {}

impl<T> fmt::Debug for SyntaxList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyntaxList").field(&self.list).finish()
    }
}

impl<T: AstNode> fmt::Display for SyntaxList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
