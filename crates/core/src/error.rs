//! Errors raised by catalog values before anything reaches the engine.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic input failures. Engine and transport errors live in the search crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An item field is unusable (blank title, negative or non-finite price).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An item id could not be parsed.
    #[error("invalid item id: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
