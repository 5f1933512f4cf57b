use std::fmt;

use text_size::{TextRange, TextSize};

use super::{check_index, check_position, not_a_member};
use crate::green::{GreenNode, Slot};
use crate::{NodeOrToken, SyntaxError, SyntaxKind, SyntaxNode, SyntaxResult, SyntaxToken};

/// The tokens of one list slot.
///
/// Two views are equal when they share owner, backing list and slot index;
/// their position does not take part.
#[derive(Clone, Default)]
pub struct SyntaxTokenList {
    parent: Option<SyntaxNode>,
    green: Option<GreenNode>,
    offset: TextSize,
    index: u32,
}

impl SyntaxTokenList {
    pub fn new(
        parent: Option<SyntaxNode>,
        green: Option<GreenNode>,
        offset: TextSize,
        index: usize,
    ) -> Self {
        Self { parent, green, offset, index: index as u32 }
    }

    /// The token list in `slot` of `parent`.
    pub fn from_slot(parent: &SyntaxNode, slot: usize) -> Self {
        let green = parent.green().slot(slot).and_then(|slot| slot.as_node()).cloned();
        let offset = parent.offset() + parent.green().slot_offset(slot);
        Self::new(Some(parent.clone()), green, offset, slot)
    }

    /// A detached list over `tokens`.
    pub fn create(tokens: impl IntoIterator<Item = SyntaxToken>) -> Self {
        let slots: Vec<Slot> = tokens
            .into_iter()
            .map(|token| Some(NodeOrToken::Token(token.green().clone())))
            .collect();
        Self::detached(slots)
    }

    fn detached(slots: Vec<Slot>) -> Self {
        let green = (!slots.is_empty()).then(|| GreenNode::new(SyntaxKind::LIST, slots));
        Self::new(None, green, TextSize::new(0), 0)
    }

    pub fn green(&self) -> Option<&GreenNode> {
        self.green.as_ref()
    }

    pub fn parent(&self) -> Option<&SyntaxNode> {
        self.parent.as_ref()
    }

    pub fn len(&self) -> usize {
        self.green.as_ref().map_or(0, GreenNode::slot_count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The red list node holding the tokens, when this view is attached.
    fn holder(&self) -> Option<SyntaxNode> {
        let list = self.parent.as_ref()?.slot_node(self.index as usize)?;
        let green = self.green.as_ref()?;
        list.green().ptr_eq(green).then_some(list)
    }

    pub fn get(&self, index: usize) -> SyntaxResult<SyntaxToken> {
        check_index(index, self.len())?;
        self.token_at(self.holder().as_ref(), index)
            .ok_or_else(|| SyntaxError::structure("token list slot does not hold a token"))
    }

    fn token_at(&self, holder: Option<&SyntaxNode>, index: usize) -> Option<SyntaxToken> {
        if let Some(holder) = holder {
            return holder.slot_token(index);
        }
        let green = self.green.as_ref()?;
        let token = green.slot(index)?.as_token()?.clone();
        Some(SyntaxToken::new(None, token, self.offset + green.slot_offset(index), index))
    }

    pub fn first(&self) -> Option<SyntaxToken> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<SyntaxToken> {
        self.iter().next_back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = SyntaxToken> + '_ {
        let holder = self.holder();
        (0..self.len()).filter_map(move |index| self.token_at(holder.as_ref(), index))
    }

    pub fn reverse(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.iter().rev()
    }

    pub fn any(&self) -> bool {
        !self.is_empty()
    }

    pub fn any_kind(&self, kind: SyntaxKind) -> bool {
        self.index_of_kind(kind).is_some()
    }

    pub fn index_of(&self, token: &SyntaxToken) -> Option<usize> {
        self.iter().position(|candidate| candidate == *token)
    }

    pub fn index_of_kind(&self, kind: SyntaxKind) -> Option<usize> {
        let green = self.green.as_ref()?;
        green.slots().iter().position(|slot| slot.as_ref().is_some_and(|e| e.kind() == kind))
    }

    pub fn full_span(&self) -> TextRange {
        let width = self.green.as_ref().map_or(TextSize::new(0), GreenNode::full_width);
        TextRange::at(self.offset, width)
    }

    pub fn span(&self) -> TextRange {
        match &self.green {
            Some(green) => TextRange::at(self.offset + green.leading_width(), green.width()),
            None => self.full_span(),
        }
    }

    pub fn text(&self) -> String {
        self.green.as_ref().map(GreenNode::full_text).unwrap_or_default()
    }

    fn slots(&self) -> Vec<Slot> {
        self.green.as_ref().map(|green| green.slots().to_vec()).unwrap_or_default()
    }

    pub fn add(&self, token: SyntaxToken) -> SyntaxResult<Self> {
        self.insert(self.len(), token)
    }

    pub fn add_range(&self, tokens: impl IntoIterator<Item = SyntaxToken>) -> SyntaxResult<Self> {
        self.insert_range(self.len(), tokens)
    }

    pub fn insert(&self, index: usize, token: SyntaxToken) -> SyntaxResult<Self> {
        self.insert_range(index, [token])
    }

    pub fn insert_range(
        &self,
        index: usize,
        tokens: impl IntoIterator<Item = SyntaxToken>,
    ) -> SyntaxResult<Self> {
        check_position(index, self.len())?;
        let mut slots = self.slots();
        slots.splice(index..index, tokens.into_iter().map(token_slot));
        Ok(Self::detached(slots))
    }

    pub fn remove_at(&self, index: usize) -> SyntaxResult<Self> {
        check_index(index, self.len())?;
        let mut slots = self.slots();
        slots.remove(index);
        Ok(Self::detached(slots))
    }

    pub fn remove(&self, token: &SyntaxToken) -> SyntaxResult<Self> {
        let index = self.index_of(token).ok_or_else(|| not_a_member("token"))?;
        self.remove_at(index)
    }

    pub fn replace(
        &self,
        token_in_list: &SyntaxToken,
        new_token: SyntaxToken,
    ) -> SyntaxResult<Self> {
        self.replace_range(token_in_list, [new_token])
    }

    pub fn replace_range(
        &self,
        token_in_list: &SyntaxToken,
        new_tokens: impl IntoIterator<Item = SyntaxToken>,
    ) -> SyntaxResult<Self> {
        let index = self.index_of(token_in_list).ok_or_else(|| not_a_member("token_in_list"))?;
        let mut slots = self.slots();
        slots.splice(index..=index, new_tokens.into_iter().map(token_slot));
        Ok(Self::detached(slots))
    }
}

fn token_slot(token: SyntaxToken) -> Slot {
    Some(NodeOrToken::Token(token.green().clone()))
}

impl PartialEq for SyntaxTokenList {
    fn eq(&self, other: &Self) -> bool {
        let same_green = match (&self.green, &other.green) {
            (None, None) => true,
            (Some(this), Some(other)) => this.ptr_eq(other),
            _ => false,
        };
        self.parent == other.parent && same_green && self.index == other.index
    }
}

impl Eq for SyntaxTokenList {}

impl fmt::Debug for SyntaxTokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for SyntaxTokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlainLanguage;
    use crate::green::{GreenToken, GreenTrivia, GreenTriviaList, TriviaKind};

    const WORD: SyntaxKind = SyntaxKind(40);
    const DOT: SyntaxKind = SyntaxKind(41);
    const ITEM: SyntaxKind = SyntaxKind(42);

    fn word(text: &str) -> GreenToken {
        let space = GreenTrivia::new(TriviaKind::Whitespace, " ");
        GreenToken::new(WORD, text).with_trailing(GreenTriviaList::new([space]))
    }

    fn item() -> SyntaxNode {
        let words = ["a", "b", "c"].map(|text| Some(word(text).into()));
        let list = GreenNode::new(SyntaxKind::LIST, words);
        let dot = GreenToken::new(DOT, ".");
        SyntaxNode::new_root(
            GreenNode::new(ITEM, [Some(list.into()), Some(dot.into())]),
            &PlainLanguage,
        )
    }

    #[test]
    fn navigation() {
        let root = item();
        let list = SyntaxTokenList::from_slot(&root, 0);

        assert_eq!(list.len(), 3);
        assert_eq!(list.text(), "a b c ");
        assert_eq!(list.get(1).unwrap().text(), "b");
        assert!(list.get(3).is_err());
        let reversed: Vec<String> = list.reverse().map(|t| t.text().to_owned()).collect();
        assert_eq!(reversed, ["c", "b", "a"]);

        let b = list.get(1).unwrap();
        assert_eq!(list.index_of(&b), Some(1));
        assert_eq!(list.index_of_kind(WORD), Some(0));
        assert!(!list.any_kind(DOT));
        assert_eq!(u32::from(list.last().unwrap().offset()), 4);
    }

    #[test]
    fn equality_follows_the_slot_not_the_offset() {
        let root = item();
        let list = SyntaxTokenList::from_slot(&root, 0);
        let shifted = SyntaxTokenList::new(
            Some(root.clone()),
            list.green().cloned(),
            TextSize::new(10),
            0,
        );
        assert_eq!(list, shifted);

        let other_index = SyntaxTokenList::new(Some(root), list.green().cloned(), list.offset, 1);
        assert_ne!(list, other_index);
        assert_ne!(list, SyntaxTokenList::create(list.iter()));
    }

    #[test]
    fn edits_return_detached_lists() {
        let root = item();
        let list = SyntaxTokenList::from_slot(&root, 0);
        let b = list.get(1).unwrap();
        let dot = root.slot_token(1).unwrap();

        assert_eq!(list.remove(&b).unwrap().text(), "a c ");
        assert_eq!(list.add(dot.clone()).unwrap().text(), "a b c .");
        assert_eq!(list.insert(0, dot.clone()).unwrap().text(), ".a b c ");
        assert_eq!(list.replace(&b, dot.clone()).unwrap().text(), "a .c ");
        assert!(list.insert(4, dot.clone()).is_err());
        assert!(list.remove(&dot).is_err());

        let empty = list.replace_range(&b, []).unwrap().remove_at(0).unwrap().remove_at(0).unwrap();
        assert!(empty.is_empty());
        assert!(empty.green().is_none());
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn insert_then_remove_restores_every_position() {
        let root = item();
        let list = SyntaxTokenList::from_slot(&root, 0);
        let extra = SyntaxToken::detached(word("x"));

        for index in 0..=list.len() {
            let inserted = list.insert(index, extra.clone()).unwrap();
            assert_eq!(inserted.len(), 4);
            assert_eq!(inserted.get(index).unwrap().text(), "x");

            let restored = inserted.remove_at(index).unwrap();
            assert_eq!(restored.text(), list.text());
            assert_eq!(restored.len(), list.len());
        }
    }
}
