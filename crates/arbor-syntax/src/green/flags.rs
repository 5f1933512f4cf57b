use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit flags summarising a green element and everything below it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const NONE: Self = Self(0);
    pub const IS_NOT_MISSING: Self = Self(1 << 0);
    pub const CONTAINS_DIAGNOSTICS: Self = Self(1 << 1);
    pub const CONTAINS_ANNOTATIONS: Self = Self(1 << 2);
    pub const CONTAINS_SKIPPED_TEXT: Self = Self(1 << 3);
    pub const CONTAINS_STRUCTURED_TRIVIA: Self = Self(1 << 4);
    pub const CONTAINS_DIRECTIVES: Self = Self(1 << 5);

    const NAMES: [(Self, &'static str); 6] = [
        (Self::IS_NOT_MISSING, "IS_NOT_MISSING"),
        (Self::CONTAINS_DIAGNOSTICS, "CONTAINS_DIAGNOSTICS"),
        (Self::CONTAINS_ANNOTATIONS, "CONTAINS_ANNOTATIONS"),
        (Self::CONTAINS_SKIPPED_TEXT, "CONTAINS_SKIPPED_TEXT"),
        (Self::CONTAINS_STRUCTURED_TRIVIA, "CONTAINS_STRUCTURED_TRIVIA"),
        (Self::CONTAINS_DIRECTIVES, "CONTAINS_DIRECTIVES"),
    ];

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b11_1111)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for NodeFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for NodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}
