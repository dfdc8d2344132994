//! API error types.

use crate::pipeline::{ErrorKind, PipelineError};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error kind for programmatic handling.
    pub error_kind: String,
    /// Human-readable error message.
    pub detail: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", .0.detail)]
    Pipeline(#[from] PipelineError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error kind reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pipeline(e) => e.kind.as_str(),
            Self::BadRequest(_) => "bad_request",
            Self::InvalidCredentials => ErrorKind::Unauthenticated.as_str(),
            Self::Internal(_) => ErrorKind::Internal.as_str(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Pipeline(e) => match e.kind {
                ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Exhausted => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::RemoteUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::RemoteRejected => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<shortlink_core::Error> for ApiError {
    fn from(e: shortlink_core::Error) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error_kind: self.code().to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
