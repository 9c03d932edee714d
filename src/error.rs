use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::upstream::UpstreamError;

/// Unified application error type for all HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Upstream error ({status}): {message}")]
    UpstreamWithStatus { status: u16, message: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    message: String,
    r#type: String,
    code: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamWithStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Unauthorized(_) => "authentication_error",
            Self::NotFound(_) => "not_found_error",
            Self::BadRequest(_) => "invalid_request_error",
            Self::RateLimited(_) => "rate_limit_error",
            Self::Upstream(_) | Self::UpstreamWithStatus { .. } => "upstream_error",
            Self::Database(_) | Self::Internal(_) => "server_error",
        }
    }

    fn error_code(&self) -> Option<&str> {
        match self {
            Self::RateLimited(_) => Some("rate_limit_exceeded"),
            Self::Unauthorized(_) => Some("invalid_api_key"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: self.error_type().to_string(),
                code: self.error_code().map(String::from),
            },
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        tracing::error!(error = %err, "Database error");
        Self::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!(error = %err, "HTTP client error");
        Self::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {err}"))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match &err {
            // Preserve 429 semantics for rate limiting.
            UpstreamError::RateLimited { .. } => Self::RateLimited(err.to_string()),

            // The pool core rejected our service token -> 502, not 401: the
            // operator's own key was fine, the deployment is misconfigured.
            UpstreamError::Unauthorized => Self::Upstream(err.to_string()),

            UpstreamError::NotFound(id) => Self::NotFound(format!("Credential '{id}' not found")),

            // API errors preserve the upstream status code.
            UpstreamError::Api { status, message } => Self::UpstreamWithStatus {
                status: *status,
                message: message.clone(),
            },

            _ => Self::Upstream(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RateLimited("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Upstream("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_upstream_status_passthrough() {
        let err = AppError::UpstreamWithStatus {
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_upstream_invalid_status_falls_back() {
        let err = AppError::UpstreamWithStatus {
            status: 42,
            message: "weird".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_rate_limit_conversion() {
        let err: AppError = UpstreamError::RateLimited {
            retry_after_secs: 30,
        }
        .into();
        assert!(matches!(err, AppError::RateLimited(_)));
    }

    #[test]
    fn test_not_found_conversion_names_credential() {
        let err: AppError = UpstreamError::NotFound("cred-9".into()).into();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("cred-9")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
