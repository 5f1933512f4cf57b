use crate::SyntaxKind;

const WORDS: usize = 4;

/// Set of kinds below 256, usable in `const` items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyntaxSet([u64; WORDS]);

const fn locate(kind: SyntaxKind) -> Option<(usize, u64)> {
    let word = (kind.0 / u64::BITS as u16) as usize;
    if word >= WORDS {
        return None;
    }
    Some((word, 1 << (kind.0 % u64::BITS as u16)))
}

impl SyntaxSet {
    pub const EMPTY: Self = Self([0; WORDS]);

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut set = Self::EMPTY;
        let mut i = 0;
        while i < N {
            set = set.with(kinds[i]);
            i += 1;
        }
        set
    }

    /// Panics at compile time in `const` items when `kind` does not fit.
    pub const fn with(mut self, kind: SyntaxKind) -> Self {
        match locate(kind) {
            Some((word, bit)) => self.0[word] |= bit,
            None => panic!("kind out of range for SyntaxSet"),
        }
        self
    }

    pub const fn union(mut self, other: Self) -> Self {
        let mut word = 0;
        while word < WORDS {
            self.0[word] |= other.0[word];
            word += 1;
        }
        self
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        match locate(kind) {
            Some((word, bit)) => self.0[word] & bit != 0,
            None => false,
        }
    }

    pub const fn is_empty(&self) -> bool {
        let mut word = 0;
        while word < WORDS {
            if self.0[word] != 0 {
                return false;
            }
            word += 1;
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        (0..(WORDS as u16 * u64::BITS as u16)).map(SyntaxKind).filter(|&kind| self.contains(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: SyntaxSet = SyntaxSet::new([SyntaxKind(17), SyntaxKind(70), SyntaxKind(255)]);

    #[test]
    fn contains_only_members() {
        assert!(SET.contains(SyntaxKind(17)));
        assert!(SET.contains(SyntaxKind(70)));
        assert!(SET.contains(SyntaxKind(255)));
        assert!(!SET.contains(SyntaxKind(18)));
        assert!(!SET.contains(SyntaxKind(1024)));
    }

    #[test]
    fn union_and_iteration() {
        let more = SyntaxSet::EMPTY.with(SyntaxKind(3)).union(SET);
        let kinds: Vec<u16> = more.iter().map(|kind| kind.0).collect();
        assert_eq!(kinds, [3, 17, 70, 255]);
        assert!(SyntaxSet::EMPTY.is_empty());
        assert!(!more.is_empty());
    }
}
