//! Error types for the object pool

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Returned object doesn't belong in this pool")]
    NotOwned,

    #[error("Pool has been disposed")]
    Disposed,

    #[error("Failed to create pooled object: {0}")]
    CreationFailed(String),

    #[error("Failed to destroy pooled object: {0}")]
    DestructionFailed(String),
}

impl PoolError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        PoolError::InvalidArgument(what.into())
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
