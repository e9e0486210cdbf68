//! Error handling for the car service.
//!
//! Every failure a handler or the connection middleware can hit is one of a
//! small, closed set of kinds. `AppError` maps each kind to an HTTP status and
//! a client-safe message; internal detail is logged, never sent.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::envelope::Envelope;

/// Message returned to clients for any server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The addressed record does not exist (or is soft-deleted).
    ///
    /// Returns HTTP 404 Not Found. The payload names the resource, e.g. "Car".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request body or path could not be decoded.
    ///
    /// Returns HTTP 400 Bad Request with the decoder's explanation.
    #[error("Invalid request: {0}")]
    ValidationFailed(String),

    /// Database operation failed (pool acquisition, session setup, or query).
    ///
    /// Returns HTTP 500 and hides details from the client.
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    /// No leased connection is attached to the request, or it was already
    /// handed back to the pool.
    #[error("Request connection unavailable")]
    ConnectionUnavailable,

    /// A statement could not be built, e.g. a named parameter had no value.
    #[error("Statement error: {0}")]
    Statement(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationFailed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationFailed(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Storage(_) | AppError::ConnectionUnavailable | AppError::Statement(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// All errors return the standard envelope:
/// ```json
/// { "success": false, "message": "Car not found", "data": null }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, Json(Envelope::<()>::failure(message))).into_response()
    }
}
