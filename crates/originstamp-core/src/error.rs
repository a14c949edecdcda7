//! Error types for OriginStamp Core.

use thiserror::Error;

/// Errors raised by the pure core primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A digest string was not 64 hex characters.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Content bytes were not valid UTF-8.
    #[error("content is not valid UTF-8: {0}")]
    InvalidEncoding(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
