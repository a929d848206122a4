//! Error types for webstatus operations

use crate::EntityKind;
use thiserror::Error;

/// Storage layer errors.
///
/// `NotFound` is the only variant callers are expected to branch on; every
/// other variant is an internal failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {kind} with key {key}")]
    NotFound { kind: EntityKind, key: String },

    #[error("Query on {table} failed: {reason}")]
    QueryFailed { table: String, reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Contract violation on {table}: {reason}")]
    ContractViolation { table: String, reason: String },

    #[error("Row serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Internal query failure")]
    InternalQueryFailure,

    #[error("Invalid page token")]
    InvalidPageToken,
}

impl StorageError {
    /// Returns true for the expected "no such row" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Response cache errors.
///
/// These never leave the cache layer; they are logged and downgraded to a
/// miss or a no-op.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cached data not found")]
    NotFound,

    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Cache payload serialization error: {reason}")]
    Serialization { reason: String },

    #[error("Cache call timed out after {millis}ms")]
    Timeout { millis: u64 },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all webstatus errors.
#[derive(Debug, Clone, Error)]
pub enum WebstatusError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for webstatus operations.
pub type WebstatusResult<T> = Result<T, WebstatusError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for cache backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            kind: EntityKind::WebFeature,
            key: "grid".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("web_feature"));
        assert!(msg.contains("grid"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_contract_violation_is_not_not_found() {
        let err = StorageError::ContractViolation {
            table: "WebFeatures".to_string(),
            reason: "2 rows".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(format!("{}", err).contains("WebFeatures"));
    }

    #[test]
    fn test_cache_error_display_timeout() {
        let err = CacheError::Timeout { millis: 250 };
        assert!(format!("{}", err).contains("250ms"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "WEBSTATUS_CACHE_TTL_SECS".to_string(),
            value: "soon".to_string(),
            reason: "must be an integer".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("WEBSTATUS_CACHE_TTL_SECS"));
        assert!(msg.contains("soon"));
        assert!(msg.contains("must be an integer"));
    }

    #[test]
    fn test_webstatus_error_from_variants() {
        let storage = WebstatusError::from(StorageError::InternalQueryFailure);
        assert!(matches!(storage, WebstatusError::Storage(_)));

        let cache = WebstatusError::from(CacheError::NotFound);
        assert!(matches!(cache, WebstatusError::Cache(_)));

        let config = WebstatusError::from(ConfigError::MissingRequired {
            field: "listen_addr".to_string(),
        });
        assert!(matches!(config, WebstatusError::Config(_)));
    }

    #[test]
    fn test_serde_error_converts_to_serialization() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(
            StorageError::from(err),
            StorageError::Serialization { .. }
        ));
    }
}
