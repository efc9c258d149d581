//! Mapping of store and codec errors onto HTTP responses

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::TodoError;

/// Error returned by handlers: a status plus a plain-text message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A path segment that cannot name any item
    pub fn unknown_id(raw: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("Item {} not found", raw))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            err if err.is_client_error() => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => {
                tracing::error!("Request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}
