//! Error envelope: `{ok: false, error: {code, message, details?}}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::domain::DomainError;

const GENERIC_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    InternalServerError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub ok: bool,
    pub error: ApiErrorDetail,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                ok: false,
                error: ApiErrorDetail {
                    code,
                    message: message.into(),
                    details: None,
                },
            },
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.body.error.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ErrorCode::Conflict, message)
    }

    /// Quota denial: 429 status, but the code stays in the fixed `FORBIDDEN` class
    pub fn too_many_requests(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, ErrorCode::Forbidden, message)
        .with_details(json!({ "retryAfterSeconds": retry_after_secs }))
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            GENERIC_MESSAGE,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::Unauthorized { message } => Self::unauthorized(message),
            DomainError::Forbidden { message } => Self::forbidden(message),
            DomainError::Conflict { message } => Self::conflict(message),
            DomainError::RateLimited {
                message,
                retry_after_secs,
            } => Self::too_many_requests(message, retry_after_secs),
            DomainError::Provider { kind, .. } => Self::bad_request(kind.user_message()),
            other => {
                error!(error = %other, "Unhandled error reached the API boundary");
                Self::internal()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.body.error.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProviderErrorKind;

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (DomainError::forbidden("x"), StatusCode::FORBIDDEN),
            (DomainError::conflict("x"), StatusCode::CONFLICT),
            (DomainError::rate_limited("x", 10), StatusCode::TOO_MANY_REQUESTS),
            (
                DomainError::provider(ProviderErrorKind::Generic, "x"),
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::storage("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(DomainError::storage("connection refused at 10.0.0.3"));
        let json = serde_json::to_value(&err.body).unwrap();

        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(json["error"]["message"], GENERIC_MESSAGE);
    }

    #[test]
    fn test_provider_error_uses_kind_message() {
        let err = ApiError::from(DomainError::provider(
            ProviderErrorKind::QuotaExceeded,
            "HTTP 429: {\"error\":...}",
        ));

        assert_eq!(
            err.body.error.message,
            ProviderErrorKind::QuotaExceeded.user_message()
        );
    }

    #[test]
    fn test_rate_limit_carries_retry_window() {
        let err = ApiError::from(DomainError::rate_limited("slow down", 3600));
        let json = serde_json::to_value(&err.body).unwrap();

        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["error"]["details"]["retryAfterSeconds"], 3600);
    }
}
