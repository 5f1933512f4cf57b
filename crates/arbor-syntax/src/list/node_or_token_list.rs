use std::fmt;

use text_size::{TextRange, TextSize};

use super::{check_index, check_position, detached_list, language_of, not_a_member};
use crate::green::{GreenNode, Slot};
use crate::{Language, SyntaxError, SyntaxKind, SyntaxNode, SyntaxNodeOrToken, SyntaxResult};

/// A list whose slots may hold nodes or tokens.
///
/// Unlike node lists, an absent element is reported as out of range: there
/// is no "nothing" element to point at.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SyntaxNodeOrTokenList {
    list: Option<SyntaxNode>,
}

impl SyntaxNodeOrTokenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_list_node(list: Option<SyntaxNode>) -> Self {
        Self { list }
    }

    pub fn create<E: Into<Option<SyntaxNodeOrToken>>>(
        elements: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        Self::new().add_range(elements)
    }

    pub(crate) fn from_slots(
        kind: SyntaxKind,
        slots: Vec<Slot>,
        language: &'static dyn Language,
    ) -> Self {
        Self { list: detached_list(kind, slots, language) }
    }

    pub fn list_node(&self) -> Option<&SyntaxNode> {
        self.list.as_ref()
    }

    pub fn green(&self) -> Option<&GreenNode> {
        self.list.as_ref().map(SyntaxNode::green)
    }

    pub(crate) fn kind(&self) -> SyntaxKind {
        self.list.as_ref().map_or(SyntaxKind::LIST, SyntaxNode::kind)
    }

    pub fn len(&self) -> usize {
        self.list.as_ref().map_or(0, SyntaxNode::slot_count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element in slot `index`; an empty slot is a structural error.
    pub fn get(&self, index: usize) -> SyntaxResult<SyntaxNodeOrToken> {
        check_index(index, self.len())?;
        self.element(index).ok_or_else(|| SyntaxError::structure("list slot is empty"))
    }

    pub(crate) fn element(&self, index: usize) -> Option<SyntaxNodeOrToken> {
        self.list.as_ref()?.slot(index)
    }

    pub fn first(&self) -> Option<SyntaxNodeOrToken> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<SyntaxNodeOrToken> {
        self.iter().next_back()
    }

    /// Present elements in order; empty slots are skipped.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = SyntaxNodeOrToken> + '_ {
        (0..self.len()).filter_map(|index| self.element(index))
    }

    pub fn any(&self) -> bool {
        self.iter().next().is_some()
    }

    pub fn index_of(&self, element: &SyntaxNodeOrToken) -> Option<usize> {
        (0..self.len()).find(|&index| self.element(index).as_ref() == Some(element))
    }

    pub fn full_span(&self) -> TextRange {
        self.list.as_ref().map_or(TextRange::empty(TextSize::new(0)), SyntaxNode::full_span)
    }

    pub fn text(&self) -> String {
        self.list.as_ref().map(SyntaxNode::text).unwrap_or_default()
    }

    pub(crate) fn slots(&self) -> Vec<Slot> {
        self.green().map(|green| green.slots().to_vec()).unwrap_or_default()
    }

    fn rebuild(&self, slots: Vec<Slot>, new: &[SyntaxNodeOrToken]) -> Self {
        let language = match &self.list {
            Some(list) => list.language(),
            None => new.first().map_or_else(|| language_of(None), SyntaxNodeOrToken::language),
        };
        Self::from_slots(self.kind(), slots, language)
    }

    pub fn add(&self, element: impl Into<Option<SyntaxNodeOrToken>>) -> SyntaxResult<Self> {
        self.insert(self.len(), element)
    }

    pub fn add_range<E: Into<Option<SyntaxNodeOrToken>>>(
        &self,
        elements: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        self.insert_range(self.len(), elements)
    }

    pub fn insert(
        &self,
        index: usize,
        element: impl Into<Option<SyntaxNodeOrToken>>,
    ) -> SyntaxResult<Self> {
        let element = element.into().ok_or_else(|| absent("element"))?;
        self.insert_range(index, [element])
    }

    pub fn insert_range<E: Into<Option<SyntaxNodeOrToken>>>(
        &self,
        index: usize,
        elements: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        check_position(index, self.len())?;
        let elements = elements_of(elements)?;
        if elements.is_empty() {
            return Ok(self.clone());
        }
        let mut slots = self.slots();
        slots.splice(index..index, elements.iter().map(|element| Some(element.green())));
        Ok(self.rebuild(slots, &elements))
    }

    pub fn remove_at(&self, index: usize) -> SyntaxResult<Self> {
        check_index(index, self.len())?;
        let mut slots = self.slots();
        slots.remove(index);
        Ok(self.rebuild(slots, &[]))
    }

    pub fn remove(&self, element: &SyntaxNodeOrToken) -> SyntaxResult<Self> {
        let index = self.index_of(element).ok_or_else(|| not_a_member("element"))?;
        self.remove_at(index)
    }

    pub fn replace(
        &self,
        element_in_list: &SyntaxNodeOrToken,
        new_element: impl Into<Option<SyntaxNodeOrToken>>,
    ) -> SyntaxResult<Self> {
        let new_element = new_element.into().ok_or_else(|| absent("new_element"))?;
        self.replace_range(element_in_list, [new_element])
    }

    pub fn replace_range<E: Into<Option<SyntaxNodeOrToken>>>(
        &self,
        element_in_list: &SyntaxNodeOrToken,
        new_elements: impl IntoIterator<Item = E>,
    ) -> SyntaxResult<Self> {
        let new_elements = elements_of(new_elements)?;
        let index =
            self.index_of(element_in_list).ok_or_else(|| not_a_member("element_in_list"))?;
        let mut slots = self.slots();
        slots.splice(index..=index, new_elements.iter().map(|element| Some(element.green())));
        Ok(self.rebuild(slots, &new_elements))
    }
}

fn absent(name: &'static str) -> SyntaxError {
    SyntaxError::out_of_range(name, 0, 0)
}

fn elements_of<E: Into<Option<SyntaxNodeOrToken>>>(
    elements: impl IntoIterator<Item = E>,
) -> SyntaxResult<Vec<SyntaxNodeOrToken>> {
    elements.into_iter().map(|element| element.into().ok_or_else(|| absent("elements"))).collect()
}

impl From<SyntaxNodeOrTokenList> for Vec<SyntaxNodeOrToken> {
    fn from(list: SyntaxNodeOrTokenList) -> Self {
        list.iter().collect()
    }
}

impl fmt::Debug for SyntaxNodeOrTokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for SyntaxNodeOrTokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
