//! Error types for the store module.

use originstamp_core::ContentDigest;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record with this digest is already stored.
    #[error("digest already recorded: {0}")]
    DuplicateKey(ContentDigest),

    /// No record with this digest.
    #[error("digest not found: {0}")]
    NotFound(ContentDigest),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking database task failed.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
