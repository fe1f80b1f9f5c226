//! Document store error types

use thiserror::Error;

/// Errors that can occur in a document store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Path does not address a document or collection
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Document required by the operation does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Backend returned an error response
    #[error("Backend error {status}: {message}")]
    Backend { status: u16, message: String },

    /// Transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Store unavailable")]
    Unavailable,

    /// Value could not be converted to or from the wire format
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl StoreError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else if e.is_connect() {
            StoreError::Unavailable
        } else {
            StoreError::Request(e)
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encoding(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
