//! Error types for the client module.

use thiserror::Error;

/// Errors that can occur talking to the timestamping service or the mailer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("request to timestamp service failed: {0}")]
    Remote(String),

    /// The service answered with a non-success status.
    #[error("timestamp service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("invalid response from timestamp service: {0}")]
    Decode(String),

    /// The HTTP client could not be built.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// A message could not be handed to the mail system.
    #[error("mail delivery failed: {0}")]
    Mail(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Remote(format!("timed out: {}", e))
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Remote(e.to_string())
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
