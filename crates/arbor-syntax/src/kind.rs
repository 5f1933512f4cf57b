//! Opaque kind tags and the per-language hooks the core consults.

use std::fmt;

use crate::green::{GreenToken, GreenTrivia, TriviaKind};

/// A kind tag. The core reserves a handful of values below
/// [`SyntaxKind::FIRST_LANGUAGE_KIND`]; everything above belongs to the language.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxKind(pub u16);

impl SyntaxKind {
    pub const TOMBSTONE: Self = Self(0);
    /// A plain list of nodes or tokens.
    pub const LIST: Self = Self(1);
    /// Elements in even slots, separators in odd slots.
    pub const SEPARATED_LIST: Self = Self(2);

    pub const FIRST_LANGUAGE_KIND: u16 = 16;

    #[inline]
    pub const fn is_list(self) -> bool {
        self.0 == Self::LIST.0 || self.0 == Self::SEPARATED_LIST.0
    }

    #[inline]
    pub const fn is_separated_list(self) -> bool {
        self.0 == Self::SEPARATED_LIST.0
    }

    fn reserved_name(self) -> Option<&'static str> {
        Some(match self {
            Self::TOMBSTONE => "TOMBSTONE",
            Self::LIST => "LIST",
            Self::SEPARATED_LIST => "SEPARATED_LIST",
            _ => return None,
        })
    }
}

impl fmt::Debug for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reserved_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "SyntaxKind({})", self.0),
        }
    }
}

impl From<u16> for SyntaxKind {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// How a directive participates in balanced groups such as `#region`/`#endregion`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveRole {
    Open,
    Close,
    /// Kept whenever directives are preserved, balanced or not.
    Definition,
    Other,
}

/// Language-specific knowledge the generic tree needs.
pub trait Language: Send + Sync + fmt::Debug + 'static {
    fn kind_name(&self, kind: SyntaxKind) -> &'static str {
        kind.reserved_name().unwrap_or("UNKNOWN")
    }

    /// Whether `slot` of a node of kind `parent` may be left empty.
    fn is_optional_slot(&self, _parent: SyntaxKind, _slot: usize) -> bool {
        true
    }

    /// Kinds whose contents are ignored by top-level equivalence.
    fn is_executable_body(&self, _kind: SyntaxKind) -> bool {
        false
    }

    /// Kinds compared in full even inside an executable body or under top-level equivalence.
    fn is_always_significant(&self, _kind: SyntaxKind) -> bool {
        false
    }

    /// A fresh separator for a separated list of `element` nodes.
    fn list_separator(&self, _element: SyntaxKind) -> Option<GreenToken> {
        None
    }

    fn directive_role(&self, _directive: SyntaxKind) -> DirectiveRole {
        DirectiveRole::Other
    }

    fn end_of_line(&self) -> GreenTrivia {
        GreenTrivia::new(TriviaKind::EndOfLine, "\n")
    }
}

/// A language that knows nothing beyond the reserved kinds.
#[derive(Debug, Default)]
pub struct PlainLanguage;

impl Language for PlainLanguage {}

pub(crate) static PLAIN: PlainLanguage = PlainLanguage;
