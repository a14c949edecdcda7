//! Error types for the service layer.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use originstamp_client::ClientError;
use originstamp_core::{ContentDigest, CoreError};
use originstamp_store::StoreError;

/// Message shown when a download is requested for an unknown digest.
pub const NOT_FOUND_MESSAGE: &str = "Hash string not found in database.";

/// Errors from the retrieval gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No content stored under this digest.
    #[error("content not found: {0}")]
    NotFound(ContentDigest),

    /// Ledger error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Remote history could not be fetched.
    #[error("history unavailable: {0}")]
    Client(#[from] ClientError),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Gateway(GatewayError::NotFound(_)) => return not_found_response(),
            AppError::Gateway(GatewayError::Client(_)) => (StatusCode::BAD_GATEWAY, "REMOTE_ERROR"),
            AppError::Gateway(GatewayError::Store(_)) | AppError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

/// The plain-text 404 shown for unknown downloads.
pub fn not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        NOT_FOUND_MESSAGE,
    )
        .into_response()
}
