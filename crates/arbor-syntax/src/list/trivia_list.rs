use std::fmt;
use std::iter::FusedIterator;

use text_size::{TextRange, TextSize};

use super::{check_index, check_position, not_a_member};
use crate::green::{GreenTrivia, GreenTriviaList, TriviaKind};
use crate::{SyntaxResult, SyntaxToken, SyntaxTrivia};

/// The leading or trailing trivia of a token.
///
/// Equality compares owning token, backing list and index of the first piece;
/// position does not take part.
#[derive(Clone, Default)]
pub struct SyntaxTriviaList {
    token: Option<SyntaxToken>,
    green: GreenTriviaList,
    offset: TextSize,
    index: u32,
}

impl SyntaxTriviaList {
    pub fn new(
        token: Option<SyntaxToken>,
        green: GreenTriviaList,
        offset: TextSize,
        index: usize,
    ) -> Self {
        Self { token, green, offset, index: index as u32 }
    }

    pub fn create(trivia: impl IntoIterator<Item = GreenTrivia>) -> Self {
        Self::detached(GreenTriviaList::new(trivia))
    }

    fn detached(green: GreenTriviaList) -> Self {
        Self::new(None, green, TextSize::new(0), 0)
    }

    pub fn token(&self) -> Option<&SyntaxToken> {
        self.token.as_ref()
    }

    pub fn green(&self) -> &GreenTriviaList {
        &self.green
    }

    pub fn len(&self) -> usize {
        self.green.len()
    }

    pub fn is_empty(&self) -> bool {
        self.green.is_empty()
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.width())
    }

    pub fn span(&self) -> TextRange {
        self.full_span()
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        self.green.write_text(&mut out);
        out
    }

    pub fn get(&self, index: usize) -> SyntaxResult<SyntaxTrivia> {
        check_index(index, self.len())?;
        let pieces = self.green.pieces();
        let offset = self.offset + pieces[..index].iter().map(GreenTrivia::width).sum::<TextSize>();
        Ok(self.piece(index, offset))
    }

    fn piece(&self, index: usize, offset: TextSize) -> SyntaxTrivia {
        let green = self.green.pieces()[index].clone();
        SyntaxTrivia::new(self.token.clone(), green, offset, self.index as usize + index)
    }

    pub fn first(&self) -> Option<SyntaxTrivia> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<SyntaxTrivia> {
        self.iter().next_back()
    }

    pub fn iter(&self) -> TriviaIter {
        TriviaIter {
            list: self.clone(),
            front: 0,
            front_offset: self.offset,
            back: self.len(),
            back_offset: self.offset + self.green.width(),
        }
    }

    pub fn reverse(&self) -> std::iter::Rev<TriviaIter> {
        self.iter().rev()
    }

    pub fn any(&self) -> bool {
        !self.is_empty()
    }

    pub fn any_kind(&self, kind: TriviaKind) -> bool {
        self.index_of_kind(kind).is_some()
    }

    pub fn index_of(&self, trivia: &SyntaxTrivia) -> Option<usize> {
        self.iter().position(|candidate| candidate == *trivia)
    }

    pub fn index_of_kind(&self, kind: TriviaKind) -> Option<usize> {
        self.green.pieces().iter().position(|piece| piece.kind() == kind)
    }

    fn pieces(&self) -> Vec<GreenTrivia> {
        self.green.pieces().to_vec()
    }

    pub fn add(&self, trivia: GreenTrivia) -> SyntaxResult<Self> {
        self.insert(self.len(), trivia)
    }

    pub fn add_range(&self, trivia: impl IntoIterator<Item = GreenTrivia>) -> SyntaxResult<Self> {
        self.insert_range(self.len(), trivia)
    }

    pub fn insert(&self, index: usize, trivia: GreenTrivia) -> SyntaxResult<Self> {
        self.insert_range(index, [trivia])
    }

    pub fn insert_range(
        &self,
        index: usize,
        trivia: impl IntoIterator<Item = GreenTrivia>,
    ) -> SyntaxResult<Self> {
        check_position(index, self.len())?;
        let mut pieces = self.pieces();
        pieces.splice(index..index, trivia);
        Ok(Self::detached(GreenTriviaList::new(pieces)))
    }

    pub fn remove_at(&self, index: usize) -> SyntaxResult<Self> {
        check_index(index, self.len())?;
        let mut pieces = self.pieces();
        pieces.remove(index);
        Ok(Self::detached(GreenTriviaList::new(pieces)))
    }

    pub fn remove(&self, trivia: &SyntaxTrivia) -> SyntaxResult<Self> {
        let index = self.index_of(trivia).ok_or_else(|| not_a_member("trivia"))?;
        self.remove_at(index)
    }

    pub fn replace(&self, trivia_in_list: &SyntaxTrivia, new: GreenTrivia) -> SyntaxResult<Self> {
        self.replace_range(trivia_in_list, [new])
    }

    pub fn replace_range(
        &self,
        trivia_in_list: &SyntaxTrivia,
        new: impl IntoIterator<Item = GreenTrivia>,
    ) -> SyntaxResult<Self> {
        let index = self.index_of(trivia_in_list).ok_or_else(|| not_a_member("trivia_in_list"))?;
        let mut pieces = self.pieces();
        pieces.splice(index..=index, new);
        Ok(Self::detached(GreenTriviaList::new(pieces)))
    }
}

impl PartialEq for SyntaxTriviaList {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.green.ptr_eq(&other.green) && self.index == other.index
    }
}

impl Eq for SyntaxTriviaList {}

impl IntoIterator for SyntaxTriviaList {
    type Item = SyntaxTrivia;
    type IntoIter = TriviaIter;

    fn into_iter(self) -> TriviaIter {
        self.iter()
    }
}

impl IntoIterator for &SyntaxTriviaList {
    type Item = SyntaxTrivia;
    type IntoIter = TriviaIter;

    fn into_iter(self) -> TriviaIter {
        self.iter()
    }
}

impl fmt::Debug for SyntaxTriviaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for SyntaxTriviaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Walks a trivia list from either end, tracking offsets so neither direction
/// needs a prefix scan.
#[derive(Clone)]
pub struct TriviaIter {
    list: SyntaxTriviaList,
    front: usize,
    front_offset: TextSize,
    back: usize,
    back_offset: TextSize,
}

impl Iterator for TriviaIter {
    type Item = SyntaxTrivia;

    fn next(&mut self) -> Option<SyntaxTrivia> {
        if self.front >= self.back {
            return None;
        }
        let trivia = self.list.piece(self.front, self.front_offset);
        self.front_offset += trivia.green().width();
        self.front += 1;
        Some(trivia)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for TriviaIter {
    fn next_back(&mut self) -> Option<SyntaxTrivia> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.back_offset -= self.list.green.pieces()[self.back].width();
        Some(self.list.piece(self.back, self.back_offset))
    }
}

impl ExactSizeIterator for TriviaIter {}

impl FusedIterator for TriviaIter {}
