use thiserror::Error;
use zeta_core::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsmError {
    #[error("a node named `{name}` is already present in the state machine")]
    DuplicateName { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, CsmError>;
