use std::fmt;
use std::marker::PhantomData;

use text_size::TextRange;

use super::{SyntaxNodeOrTokenList, check_index, check_position, language_of, present};
use crate::ast::AstNode;
use crate::green::{GreenElement, GreenNode, GreenToken, Slot};
use crate::{Language, NodeOrToken, SyntaxError, SyntaxKind, SyntaxNode, SyntaxResult, SyntaxToken};

/// Elements in even slots and separator tokens in odd slots.
pub struct SeparatedSyntaxList<T = SyntaxNode> {
    list: SyntaxNodeOrTokenList,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AstNode> SeparatedSyntaxList<T> {
    pub fn empty() -> Self {
        Self::from_inner(SyntaxNodeOrTokenList::default())
    }

    fn from_inner(list: SyntaxNodeOrTokenList) -> Self {
        Self { list, _marker: PhantomData }
    }

    pub fn from_list_node(list: Option<SyntaxNode>) -> Self {
        Self::from_inner(SyntaxNodeOrTokenList::from_list_node(list))
    }

    /// A detached list over `nodes` with fresh separators between them.
    pub fn create<E: Into<Option<T>>>(nodes: impl IntoIterator<Item = E>) -> SyntaxResult<Self> {
        Self::empty().add_range(nodes)
    }

    /// A detached list from elements and the separators between them. There
    /// may be one separator fewer than elements, or as many for a trailing one.
    pub fn with_separators(
        nodes: impl IntoIterator<Item = T>,
        separators: impl IntoIterator<Item = SyntaxToken>,
    ) -> SyntaxResult<Self> {
        let nodes: Vec<T> = nodes.into_iter().collect();
        let separators: Vec<SyntaxToken> = separators.into_iter().collect();
        if separators.len() != nodes.len() && separators.len() + 1 != nodes.len() {
            return Err(SyntaxError::contract(format!(
                "{} separators cannot separate {} elements",
                separators.len(),
                nodes.len()
            )));
        }
        let mut slots = Vec::with_capacity(nodes.len() + separators.len());
        let mut separators = separators.into_iter();
        for node in &nodes {
            slots.push(Some(NodeOrToken::Node(node.syntax().green().clone())));
            if let Some(separator) = separators.next() {
                slots.push(Some(NodeOrToken::Token(separator.green().clone())));
            }
        }
        let language = language_of(nodes.first().map(T::syntax));
        Ok(Self::from_slots(slots, language))
    }

    /// Reinterprets an interleaved node-or-token list, checking that nodes and
    /// tokens alternate starting with a node.
    pub fn from_nodes_and_tokens(list: &SyntaxNodeOrTokenList) -> SyntaxResult<Self> {
        let slots = list.slots();
        for (index, slot) in slots.iter().enumerate() {
            let expect_separator = index % 2 == 1;
            match slot {
                Some(NodeOrToken::Token(_)) if !expect_separator => {
                    return Err(SyntaxError::contract(format!(
                        "a separator cannot stand in element position {index}"
                    )));
                }
                Some(NodeOrToken::Node(_)) if expect_separator => {
                    return Err(SyntaxError::contract(format!(
                        "an element cannot stand in separator position {index}"
                    )));
                }
                _ => {}
            }
        }
        let language = language_of(list.list_node());
        Ok(Self::from_slots(slots, language))
    }

    fn from_slots(slots: Vec<Slot>, language: &'static dyn Language) -> Self {
        Self::from_inner(SyntaxNodeOrTokenList::from_slots(
            SyntaxKind::SEPARATED_LIST,
            slots,
            language,
        ))
    }

    pub fn list_node(&self) -> Option<&SyntaxNode> {
        self.list.list_node()
    }

    pub fn green(&self) -> Option<&GreenNode> {
        self.list.green()
    }

    /// The elements interleaved with their separators.
    pub fn get_with_separators(&self) -> SyntaxNodeOrTokenList {
        self.list.clone()
    }

    pub fn len(&self) -> usize {
        self.list.len().div_ceil(2)
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn separator_count(&self) -> usize {
        self.list.len() / 2
    }

    pub fn has_trailing_separator(&self) -> bool {
        !self.list.is_empty() && self.list.len() % 2 == 0
    }

    pub fn get(&self, index: usize) -> SyntaxResult<T> {
        check_index(index, self.len())?;
        self.element(index)
            .ok_or_else(|| SyntaxError::structure("separated list element is empty or mistyped"))
    }

    fn element(&self, index: usize) -> Option<T> {
        self.list.element(index * 2)?.into_node().and_then(T::cast)
    }

    pub fn separator(&self, index: usize) -> SyntaxResult<SyntaxToken> {
        check_index(index, self.separator_count())?;
        self.list
            .element(index * 2 + 1)
            .and_then(NodeOrToken::into_token)
            .ok_or_else(|| SyntaxError::structure("separator slot is empty"))
    }

    pub fn separators(&self) -> impl DoubleEndedIterator<Item = SyntaxToken> + '_ {
        (0..self.separator_count())
            .filter_map(|index| self.list.element(index * 2 + 1)?.into_token())
    }

    pub fn first_separator(&self) -> Option<SyntaxToken> {
        self.separators().next()
    }

    pub fn first(&self) -> Option<T> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<T> {
        self.iter().next_back()
    }

    /// Present elements; empty element slots are skipped.
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
        let element = self.list.element(index * 2).and_then(NodeOrToken::into_node);
        element.as_ref() == Some(node.syntax())
    }

    pub fn index_of_kind(&self, kind: SyntaxKind) -> Option<usize> {
        let slots = self.list.green()?.slots();
        (0..self.len()).find(|&index| slots[index * 2].as_ref().is_some_and(|e| e.kind() == kind))
    }

    pub fn full_span(&self) -> TextRange {
        self.list.full_span()
    }

    pub fn span(&self) -> TextRange {
        self.list.list_node().map_or_else(|| self.full_span(), SyntaxNode::span)
    }

    pub fn text(&self) -> String {
        self.list.text()
    }

    fn language_with(&self, new: &[T]) -> &'static dyn Language {
        match self.list.list_node() {
            Some(list) => list.language(),
            None => language_of(new.first().map(T::syntax)),
        }
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

    /// Inserts before element `index`, placing separators so that a separator
    /// whose trailing trivia ends a line stays with the element before it.
    pub fn insert_range<E: Into<Option<T>>>(
        &self,
        index: usize,
        nodes: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        check_position(index, self.len())?;
        let nodes = present("nodes", nodes)?;
        let language = self.language_with(&nodes);
        let mut slots = self.list.slots();
        let greens = nodes.iter().map(|node| node.syntax().green().clone()).collect();
        insert_elements(&mut slots, index, greens, language)?;
        Ok(Self::from_slots(slots, language))
    }

    pub fn remove_at(&self, index: usize) -> SyntaxResult<Self> {
        check_index(index, self.len())?;
        let mut slots = self.list.slots();
        remove_element(&mut slots, index);
        Ok(Self::from_slots(slots, self.language_with(&[])))
    }

    pub fn remove(&self, node: &T) -> SyntaxResult<Self> {
        let index = self.index_of(node).ok_or_else(|| super::not_a_member("node"))?;
        self.remove_at(index)
    }

    /// Replacing something that is not an element is out of range here,
    /// unlike the other lists.
    pub fn replace(&self, node_in_list: &T, new_node: impl Into<Option<T>>) -> SyntaxResult<Self> {
        let new_node = new_node.into().ok_or(SyntaxError::NullArgument("new_node"))?;
        let index = self.member_index(node_in_list)?;
        let mut slots = self.list.slots();
        slots[index * 2] = Some(NodeOrToken::Node(new_node.syntax().green().clone()));
        Ok(Self::from_slots(slots, self.language_with(&[])))
    }

    pub fn replace_range<E: Into<Option<T>>>(
        &self,
        node_in_list: &T,
        new_nodes: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        let mut new_nodes = present("new_nodes", new_nodes)?;
        let index = self.member_index(node_in_list)?;
        if new_nodes.is_empty() {
            return self.remove_at(index);
        }
        let rest = new_nodes.split_off(1);
        let first = new_nodes.pop().ok_or(SyntaxError::NullArgument("new_nodes"))?;
        let replaced = self.replace(node_in_list, first)?;
        if rest.is_empty() { Ok(replaced) } else { replaced.insert_range(index + 1, rest) }
    }

    pub fn replace_separator(
        &self,
        separator: &SyntaxToken,
        new_separator: &SyntaxToken,
    ) -> SyntaxResult<Self> {
        let position = (0..self.separator_count())
            .find(|&index| {
                let element = self.list.element(index * 2 + 1);
                element.as_ref().and_then(NodeOrToken::as_token) == Some(separator)
            })
            .ok_or_else(|| super::not_a_member("separator"))?;
        if new_separator.kind() != separator.kind() {
            return Err(SyntaxError::contract(
                "a separator can only be replaced by one of its kind",
            ));
        }
        let mut slots = self.list.slots();
        slots[position * 2 + 1] = Some(NodeOrToken::Token(new_separator.green().clone()));
        Ok(Self::from_slots(slots, self.language_with(&[])))
    }

    fn member_index(&self, node: &T) -> SyntaxResult<usize> {
        self.index_of(node)
            .ok_or_else(|| SyntaxError::out_of_range("node_in_list", self.len(), self.len()))
    }
}

/// Inserts `new` before element `index` of interleaved `slots`.
pub(crate) fn insert_elements(
    slots: &mut Vec<Slot>,
    index: usize,
    new: Vec<GreenNode>,
    language: &'static dyn Language,
) -> SyntaxResult<()> {
    if new.is_empty() {
        return Ok(());
    }
    let element_count = slots.len().div_ceil(2);
    let mut at = if index < element_count { index * 2 } else { slots.len() };
    if at > 0
        && at < slots.len()
        && let Some(NodeOrToken::Token(previous)) = &slots[at - 1]
        && !previous.trailing().contains_end_of_line()
    {
        at -= 1;
    }

    let mut inserted: Vec<Slot> = Vec::with_capacity(new.len() * 2);
    for node in &new {
        if !inserted.is_empty() || (at > 0 && is_element_slot(at - 1)) {
            inserted.push(Some(fresh_separator(slots, node, language)?));
        }
        inserted.push(Some(NodeOrToken::Node(node.clone())));
    }
    if at < slots.len() && is_element_slot(at) {
        let next = match &slots[at] {
            Some(NodeOrToken::Node(next)) => next.clone(),
            _ => new[new.len() - 1].clone(),
        };
        inserted.push(Some(fresh_separator(slots, &next, language)?));
    }
    slots.splice(at..at, inserted);
    Ok(())
}

/// Removes element `index` with the separator after it, or the one before it
/// when it is last.
pub(crate) fn remove_element(slots: &mut Vec<Slot>, index: usize) {
    let at = index * 2;
    slots.remove(at);
    if at < slots.len() {
        slots.remove(at);
    } else if at > 0 {
        slots.remove(at - 1);
    }
}

fn is_element_slot(index: usize) -> bool {
    index % 2 == 0
}

/// A separator without trivia, copied from one already in the list when possible.
fn fresh_separator(
    slots: &[Slot],
    element: &GreenNode,
    language: &'static dyn Language,
) -> SyntaxResult<GreenElement> {
    let existing = slots.iter().skip(1).step_by(2).find_map(|slot| match slot {
        Some(NodeOrToken::Token(token)) if !token.is_missing() => Some(token),
        _ => None,
    });
    let token = match existing {
        Some(token) => GreenToken::new(token.kind(), token.text()),
        None => language.list_separator(element.kind()).ok_or_else(|| {
            SyntaxError::contract("no separator is available for this list")
        })?,
    };
    Ok(NodeOrToken::Token(token))
}

impl<T> Clone for SeparatedSyntaxList<T> {
    fn clone(&self) -> Self {
        Self { list: self.list.clone(), _marker: PhantomData }
    }
}

impl<T> Default for SeparatedSyntaxList<T> {
    fn default() -> Self {
        Self { list: SyntaxNodeOrTokenList::default(), _marker: PhantomData }
    }
}

impl<T> PartialEq for SeparatedSyntaxList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl<T> Eq for SeparatedSyntaxList<T> {}

impl<T> fmt::Debug for SeparatedSyntaxList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SeparatedSyntaxList").field(&self.list).finish()
    }
}

impl<T: AstNode> fmt::Display for SeparatedSyntaxList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
