//! Shared JSON error body and the mapping from component errors to HTTP responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Standard error response format for all API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "invalid_state")
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Convert to HTTP response with specified status code
    pub fn into_response(self, status: StatusCode) -> Response {
        reply::with_status(reply::json(&self), status).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Which log level an error is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Rejected request; the caller can fix it
    Client,
    /// Unexpected failure while serving a valid request
    Server,
    /// Shared state may be damaged
    Critical,
}

impl ErrorSeverity {
    pub fn log(self, error: &ErrorResponse) {
        match self {
            ErrorSeverity::Client => {
                tracing::info!(code = %error.error, message = %error.message, "request rejected")
            }
            ErrorSeverity::Server => {
                tracing::error!(code = %error.error, message = %error.message, "request failed")
            }
            ErrorSeverity::Critical => tracing::error!(
                code = %error.error,
                message = %error.message,
                critical = true,
                "request failed"
            ),
        }
    }
}

/// Maps a component error onto a status code and an [`ErrorResponse`] body.
pub trait IntoErrorResponse {
    fn status_code(&self) -> StatusCode;

    /// Machine-readable code, e.g. `invalid_state`.
    fn error_code(&self) -> &'static str;

    fn error_message(&self) -> String;

    fn severity(&self) -> ErrorSeverity {
        if self.status_code().is_server_error() {
            ErrorSeverity::Server
        } else {
            ErrorSeverity::Client
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.error_code(), self.error_message())
    }

    /// Logs at the error's severity and builds the JSON response.
    fn into_http_response(self) -> Response
    where
        Self: Sized,
    {
        let body = self.to_error_response();
        self.severity().log(&body);
        body.into_response(self.status_code())
    }
}
