use std::iter::FusedIterator;

use super::{SyntaxNode, SyntaxNodeOrToken};
use crate::{NodeOrToken, SyntaxError, SyntaxResult};

/// The children of a node with list slots flattened and empty slots skipped.
#[derive(Clone, Debug)]
pub struct ChildSyntaxList {
    node: SyntaxNode,
    len: usize,
}

impl ChildSyntaxList {
    pub(crate) fn new(node: SyntaxNode) -> Self {
        let len = node
            .green()
            .slots()
            .iter()
            .map(|slot| match slot {
                None => 0,
                Some(NodeOrToken::Node(list)) if list.is_list() => list.present_count(),
                Some(_) => 1,
            })
            .sum();
        Self { node, len }
    }

    pub fn node(&self) -> &SyntaxNode {
        &self.node
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether there is at least one child.
    pub fn any(&self) -> bool {
        !self.is_empty()
    }

    /// Jumps to the owning slot, then into a list by index when it has no holes.
    pub fn get(&self, index: usize) -> SyntaxResult<SyntaxNodeOrToken> {
        let out_of_range = || SyntaxError::out_of_range("index", index, self.len);
        if index >= self.len {
            return Err(out_of_range());
        }

        let mut rest = index;
        for (slot, green) in self.node.green().slots().iter().enumerate() {
            match green {
                None => {}
                Some(NodeOrToken::Node(list)) if list.is_list() => {
                    let present = list.present_count();
                    if rest >= present {
                        rest -= present;
                        continue;
                    }
                    let inner = if present == list.slot_count() {
                        Some(rest)
                    } else {
                        let filled = list.slots().iter().enumerate();
                        filled.filter(|(_, element)| element.is_some()).nth(rest).map(|(i, _)| i)
                    };
                    let list = self.node.slot_node(slot);
                    return inner.and_then(|inner| list?.slot(inner)).ok_or_else(out_of_range);
                }
                Some(_) if rest == 0 => return self.node.slot(slot).ok_or_else(out_of_range),
                Some(_) => rest -= 1,
            }
        }
        Err(out_of_range())
    }

    pub fn first(&self) -> Option<SyntaxNodeOrToken> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<SyntaxNodeOrToken> {
        self.iter().next_back()
    }

    pub fn iter(&self) -> ChildIter {
        ChildIter::new(self.node.clone(), self.len)
    }

    /// Children from last to first without a forward pass.
    pub fn reverse(&self) -> std::iter::Rev<ChildIter> {
        self.iter().rev()
    }
}

impl IntoIterator for ChildSyntaxList {
    type Item = SyntaxNodeOrToken;
    type IntoIter = ChildIter;

    fn into_iter(self) -> ChildIter {
        ChildIter::new(self.node, self.len)
    }
}

impl IntoIterator for &ChildSyntaxList {
    type Item = SyntaxNodeOrToken;
    type IntoIter = ChildIter;

    fn into_iter(self) -> ChildIter {
        self.iter()
    }
}

#[derive(Clone, Debug)]
pub struct ChildIter {
    node: SyntaxNode,
    front_slot: usize,
    front_inner: usize,
    back_slot: usize,
    back_inner: Option<usize>,
    remaining: usize,
}

impl ChildIter {
    fn new(node: SyntaxNode, len: usize) -> Self {
        let back_slot = node.slot_count();
        Self { node, front_slot: 0, front_inner: 0, back_slot, back_inner: None, remaining: len }
    }
}

impl Iterator for ChildIter {
    type Item = SyntaxNodeOrToken;

    fn next(&mut self) -> Option<SyntaxNodeOrToken> {
        while self.remaining > 0 {
            let slot = self.front_slot;
            match self.node.green().slot(slot) {
                None => {
                    self.front_slot += 1;
                    self.front_inner = 0;
                }
                Some(NodeOrToken::Node(green)) if green.is_list() => {
                    let inner = self.front_inner;
                    if inner >= green.slot_count() {
                        self.front_slot += 1;
                        self.front_inner = 0;
                        continue;
                    }
                    self.front_inner += 1;
                    let element = self.node.slot_node(slot).and_then(|list| list.slot(inner));
                    if element.is_some() {
                        self.remaining -= 1;
                        return element;
                    }
                }
                Some(_) => {
                    self.front_slot += 1;
                    self.front_inner = 0;
                    self.remaining -= 1;
                    return self.node.slot(slot);
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for ChildIter {
    fn next_back(&mut self) -> Option<SyntaxNodeOrToken> {
        while self.remaining > 0 {
            let slot = self.back_slot - 1;
            match self.node.green().slot(slot) {
                None => {
                    self.back_slot -= 1;
                    self.back_inner = None;
                }
                Some(NodeOrToken::Node(green)) if green.is_list() => {
                    let end = self.back_inner.unwrap_or(green.slot_count());
                    if end == 0 {
                        self.back_slot -= 1;
                        self.back_inner = None;
                        continue;
                    }
                    self.back_inner = Some(end - 1);
                    let element = self.node.slot_node(slot).and_then(|list| list.slot(end - 1));
                    if element.is_some() {
                        self.remaining -= 1;
                        return element;
                    }
                }
                Some(_) => {
                    self.back_slot -= 1;
                    self.back_inner = None;
                    self.remaining -= 1;
                    return self.node.slot(slot);
                }
            }
        }
        None
    }
}

impl ExactSizeIterator for ChildIter {}

impl FusedIterator for ChildIter {}
