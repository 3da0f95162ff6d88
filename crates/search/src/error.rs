//! Search layer error model.

use itemsearch_core::DomainError;
use thiserror::Error;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("engine returned {status}: {reason}")]
    Engine {
        status: u16,
        kind: Option<String>,
        reason: String,
    },

    /// A bulk request was accepted but some documents were rejected.
    #[error("bulk indexing failed for {} document(s): {}", .failed.len(), .failed.join(", "))]
    Bulk { failed: Vec<String> },

    /// The engine response did not have the expected shape.
    #[error("unexpected engine response: {0}")]
    InvalidResponse(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The caller built a request the engine would reject anyway.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl SearchError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
