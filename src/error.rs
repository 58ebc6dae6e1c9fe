//! Gate error taxonomy and the structured response emitter.
//!
//! Every gate returns [`GateError`] on denial. The `IntoResponse` impl is the
//! single place that turns a denial into `{code, message, error}` JSON, so the
//! status mapping and the "never echo internal detail" rule live together.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;

/// Credential failures. All surface as 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no credential presented")]
    Missing,
    #[error("credential is malformed or its signature does not verify")]
    Invalid,
    #[error("credential has expired")]
    Expired,
}

/// Why an authorization gate said no. Both surface as 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ForbiddenReason {
    #[error("permission context absent")]
    ContextMissing,
    #[error("required permission not held")]
    PermissionDenied,
}

/// Why a captcha verification failed. Never distinguished to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("captcha not found")]
    NotFound,
    #[error("captcha expired")]
    Expired,
    #[error("captcha answer mismatch")]
    Mismatch,
}

/// Failure of the permission-loading collaborator.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("permission lookup timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("permission lookup failed: {0}")]
    Backend(String),
}

/// Terminal outcome of a failed gate.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("server misconfiguration: {0}")]
    Configuration(&'static str),

    #[error(transparent)]
    Authentication(#[from] AuthError),

    #[error(transparent)]
    Authorization(#[from] ForbiddenReason),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    #[error("malformed request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Collaborator(#[from] LoadError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Wire shape of every denial.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: &'static str,
    pub error: &'static str,
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::Configuration(_) | GateError::Collaborator(_) | GateError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GateError::Authentication(_) => StatusCode::UNAUTHORIZED,
            GateError::Authorization(_) | GateError::Challenge(_) => StatusCode::FORBIDDEN,
            GateError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GateError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable kind, also used as the metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::Configuration(_) => "configuration_error",
            GateError::Authentication(AuthError::Missing) => "token_missing",
            GateError::Authentication(AuthError::Invalid) => "token_invalid",
            GateError::Authentication(AuthError::Expired) => "token_expired",
            GateError::Authorization(_) => "forbidden",
            GateError::RateLimited => "rate_limited",
            GateError::Challenge(_) => "captcha_failed",
            GateError::InvalidRequest(_) => "invalid_request",
            GateError::Collaborator(_) => "collaborator_error",
            GateError::Internal(_) => "internal_error",
        }
    }

    /// Caller-facing text. Fixed per variant; internal detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            GateError::Configuration(_) | GateError::Collaborator(_) | GateError::Internal(_) => {
                "internal server error"
            }
            GateError::Authentication(AuthError::Missing) => "authentication required",
            GateError::Authentication(AuthError::Invalid) => "invalid credential",
            GateError::Authentication(AuthError::Expired) => "credential expired",
            GateError::Authorization(_) => "permission denied",
            GateError::RateLimited => "too many requests",
            GateError::Challenge(_) => "captcha verification failed",
            GateError::InvalidRequest(_) => "malformed request body",
        }
    }

    fn log(&self) {
        match self {
            GateError::Configuration(detail) => {
                tracing::error!(kind = self.kind(), detail = %detail, "Server misconfiguration")
            }
            GateError::Collaborator(e) => {
                tracing::error!(kind = self.kind(), error = %e, "Permission loading failed")
            }
            GateError::Internal(detail) => {
                tracing::error!(kind = self.kind(), detail = %detail, "Internal error")
            }
            GateError::RateLimited => {}
            other => tracing::debug!(kind = other.kind(), reason = %other, "Request denied"),
        }
    }
}

impl From<JsonRejection> for GateError {
    fn from(rejection: JsonRejection) -> Self {
        GateError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        self.log();
        metrics::record_rejection(self.kind());

        let status = self.status();
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.public_message(),
            error: self.kind(),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, GateError::RateLimited) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}
