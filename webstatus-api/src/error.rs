//! Error Types for the webstatus API
//!
//! Every failed request is answered with a JSON body of the form
//! `{"code": <http status>, "message": "..."}`. Storage failures other than
//! "not found" and "invalid page token" are logged and answered with a
//! generic message so backend detail never reaches clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use webstatus_core::{ConfigError, StorageError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error categories and the HTTP status each maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request parameters are malformed or out of range
    InvalidInput,

    /// Page token does not decode to a cursor
    InvalidPageToken,

    /// Requested entity does not exist
    EntityNotFound,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::InvalidPageToken => StatusCode::BAD_REQUEST,
            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "invalid input",
            ErrorCode::InvalidPageToken => "invalid page token",
            ErrorCode::EntityNotFound => "entity not found",
            ErrorCode::InternalError => "internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status code, repeated in the body
    pub code: u16,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.status_code().as_u16(),
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create an InvalidPageToken error.
    pub fn invalid_page_token() -> Self {
        Self::from_code(ErrorCode::InvalidPageToken)
    }

    /// Create a not found error for a feature.
    pub fn feature_not_found(feature_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("feature id {} is not found", feature_id),
        )
    }

    /// Create an InternalError error.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM STANDARD ERRORS
// ============================================================================

/// Convert from StorageError to ApiError.
///
/// Handlers that need an operation-specific message map errors themselves;
/// this conversion is the fallback.
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key, .. } => ApiError::feature_not_found(key),
            StorageError::InvalidPageToken => ApiError::invalid_page_token(),
            other => {
                tracing::error!(error = %other, "storage error");
                ApiError::from_code(ErrorCode::InternalError)
            }
        }
    }
}

/// Convert from ConfigError to ApiError.
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal_error(format!("configuration error: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use webstatus_core::EntityKind;

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::feature_not_found("grid");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"code":404,"message":"feature id grid is not found"}"#);
    }

    #[test]
    fn test_storage_error_mapping() {
        let not_found = ApiError::from(StorageError::NotFound {
            kind: EntityKind::WebFeature,
            key: "grid".to_string(),
        });
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let token = ApiError::from(StorageError::InvalidPageToken);
        assert_eq!(token.code, 400);
        assert_eq!(token.message, "invalid page token");

        let internal = ApiError::from(StorageError::TransactionFailed {
            reason: "disk on fire".to_string(),
        });
        assert_eq!(internal.code, 500);
        assert!(!internal.message.contains("disk"));
    }
}
