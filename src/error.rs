//! Service error types with HTTP status code mapping.
//!
//! [`ScannerError`] is the central error type. Ingestion and query paths
//! return it directly; the HTTP layer renders it as a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "malformed snapshot: missing field `map_cells`"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category    | HTTP Status                   |
/// |-----------|-------------|-------------------------------|
/// | 1000–1999 | Validation  | 400 Bad Request               |
/// | 3000–3999 | Server      | 500 / 503                     |
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// The map snapshot does not have the expected shape.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-transient storage failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// A transient storage failure outlived the retry policy.
    #[error("storage still busy after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of attempts made, including the first.
        attempts: u32,
        /// Error returned by the final attempt.
        #[source]
        source: sqlx::Error,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ScannerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedSnapshot(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::RetriesExhausted { .. } => 3002,
            Self::Config(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedSnapshot(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Persistence(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedSnapshot(err.to_string())
    }
}

impl IntoResponse for ScannerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            Self::RetriesExhausted { attempts, .. } => Some(format!("attempts={attempts}")),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_snapshot_is_bad_request() {
        let err = ScannerError::MalformedSnapshot("missing field".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
    }

    #[test]
    fn exhausted_retries_are_service_unavailable() {
        let err = ScannerError::RetriesExhausted {
            attempts: 5,
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("5 attempts"));
    }

    #[test]
    fn json_errors_become_malformed_snapshots() {
        let parse = serde_json::from_str::<serde_json::Value>("{");
        let Err(json_err) = parse else {
            return;
        };
        let err = ScannerError::from(json_err);
        assert_eq!(err.error_code(), 1001);
    }
}
