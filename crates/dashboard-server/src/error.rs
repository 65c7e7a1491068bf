//! Error types for the dashboard API.
//!
//! [`ApiError`] covers transport-level failures of `/api/` requests and
//! converts into a JSON response `{"error": message, "status": code}`.
//! Owner-thread action failures are not errors at this level: they are
//! reported as `{success: false, message}` or `{ok: false, message}`
//! bodies by the handlers.

use serde::Serialize;

use crate::response::{Response, StatusCode};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request is malformed or missing a parameter.
    #[error("{0}")]
    BadRequest(String),

    /// The requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// The endpoint exists but not for this method.
    #[error("{0}")]
    MethodNotAllowed(String),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error occurred.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    status: u16,
}

impl ApiError {
    /// Shorthand for [`ApiError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Shorthand for [`ApiError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Shorthand for [`ApiError::MethodNotAllowed`].
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed(message.into())
    }

    /// HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Serialization(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into a JSON error response.
    pub fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Serialization(e) => format!("JSON error: {e}"),
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: &message,
            status: status.as_u16(),
        };
        Response::json(status, &body).unwrap_or_else(|_e| Response::text(status, message.clone()))
    }
}

impl From<ApiError> for Response {
    fn from(error: ApiError) -> Self {
        error.into_response()
    }
}

/// Errors that can occur when starting or running the request server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// Not called from inside a Tokio runtime.
    #[error("no Tokio runtime: {0}")]
    Runtime(String),
}
