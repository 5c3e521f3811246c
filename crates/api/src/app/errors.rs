//! Error → HTTP response mapping.
//!
//! `ApiError` is the only place status codes are decided.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use gatekeeper_auth::{AuthError, AuthzError, PasswordError, StoreError, TokenError};
use gatekeeper_core::ValidationError;

/// Message returned for every 500; details only go to the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<ValidationError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(errors) => (
                status,
                axum::Json(json!({
                    "error": "validation_error",
                    "message": "Validation failed",
                    "errors": errors,
                })),
            )
                .into_response(),
            ApiError::BadRequest(msg) => json_error(status, "bad_request", msg),
            ApiError::Unauthorized(msg) => json_error(status, "unauthorized", msg),
            ApiError::Forbidden(e) => json_error(status, "forbidden", e.to_string()),
            ApiError::NotFound(msg) => json_error(status, "not_found", msg),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                json_error(status, "internal_error", INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => e.into(),
            rejection => ApiError::Unauthorized(rejection.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => {
                ApiError::bad_request("User with this email already exists")
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => ApiError::bad_request("Invalid credentials"),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(format!("token issuing failed: {err}"))
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
