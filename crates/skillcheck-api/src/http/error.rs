//! Application error type mapping to HTTP status codes and envelope format.

use axum::response::{IntoResponse, Response};
use serde_json::json;

use skillcheck_types::error::SessionError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Session-related errors from the service layer.
    Session(SessionError),
    /// Malformed request (bad id, mismatched body).
    Validation(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message, details) = match &self {
            AppError::Session(SessionError::NotFound) => {
                ("SESSION_NOT_FOUND", "Session not found".to_string(), None)
            }
            AppError::Session(SessionError::NotEditable(status)) => (
                "SESSION_NOT_EDITABLE",
                format!("Session is {status} and can no longer be edited"),
                Some(json!({ "status": status })),
            ),
            AppError::Session(SessionError::Validation(msg)) | AppError::Validation(msg) => {
                ("VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Session(SessionError::Conflict(msg)) => ("CONFLICT", msg.clone(), None),
            AppError::Session(SessionError::StorageError(msg)) => {
                tracing::error!(error = %msg, "storage failure");
                ("STORAGE_ERROR", msg.clone(), None)
            }
            AppError::Session(SessionError::Transport(msg)) => {
                ("TRANSPORT_ERROR", msg.clone(), None)
            }
        };

        ApiResponse::error(code, &message, details).into_response()
    }
}
