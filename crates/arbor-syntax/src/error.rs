use thiserror::Error;

/// Failure of a tree operation. Nothing is mutated in place, so a failed
/// call leaves every existing tree untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("{name} index {index} is out of range for length {len}")]
    OutOfRange { name: &'static str, index: usize, len: usize },
    #[error("`{0}` must not be absent")]
    NullArgument(&'static str),
    #[error("{0}")]
    Contract(String),
    #[error("unsupported tree shape: {0}")]
    Structure(String),
}

impl SyntaxError {
    pub(crate) fn out_of_range(name: &'static str, index: usize, len: usize) -> Self {
        Self::OutOfRange { name, index, len }
    }

    pub(crate) fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }

    pub(crate) fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    pub fn is_null_argument(&self) -> bool {
        matches!(self, Self::NullArgument(_))
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract(_))
    }

    pub fn is_structure(&self) -> bool {
        matches!(self, Self::Structure(_))
    }
}

pub type SyntaxResult<T> = Result<T, SyntaxError>;
