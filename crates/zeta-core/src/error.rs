use thiserror::Error;

/// Errors raised by [`Rolodex`](crate::Rolodex) reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("type mismatch for `{name}`: expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unable to find an entry named `{name}` in the rolodex")]
    NotFound { name: String },
}

impl StoreError {
    pub(crate) fn mismatch(name: &str, expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch {
            name: name.to_owned(),
            expected,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
