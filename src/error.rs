//! Error types for the dues portal
//!
//! All request-path errors are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Each variant maps to one HTTP status and JSON body. The bodies are
/// part of the public contract with the frontend, so the messages below
/// are fixed strings rather than the underlying cause.
#[derive(Debug, Error)]
pub enum AppError {
    /// Identity token rejected or could not be checked (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// No live session behind the request (401)
    ///
    /// A normal outcome, not a fault.
    #[error("Not logged in")]
    NotAuthenticated,

    /// Session store failed while logging out (500)
    #[error("Failed to log out")]
    LogoutFailed(#[source] StorageError),

    /// Session store failure outside of logout (500)
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failure reported by a session store backend
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StorageError(pub String);

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::NotAuthenticated => "not_authenticated",
            AppError::LogoutFailed(_) => "logout_failed",
            AppError::Storage(_) => "storage",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// `NotAuthenticated` answers with a `message` field; every other
    /// variant answers with an `error` field.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, body) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "message": self.to_string() }),
            ),
            AppError::LogoutFailed(source) => {
                tracing::error!(error = %source, "Error destroying session");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": self.to_string() }),
                )
            }
            AppError::Storage(source) => {
                tracing::error!(error = %source, "Session store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Session storage error" }),
                )
            }
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
            AppError::Internal(source) => {
                tracing::error!(error = %source, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
        };

        // Record error metric; an anonymous caller is not a fault
        if !matches!(self, AppError::NotAuthenticated) {
            use crate::metrics::ERRORS_TOTAL;
            ERRORS_TOTAL.with_label_values(&[self.error_type()]).inc();
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
