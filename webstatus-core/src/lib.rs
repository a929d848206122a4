//! webstatus Core - Entity Types
//!
//! Pure data structures shared by the storage and API crates. Nothing in this
//! crate performs I/O: entity rows, their natural keys, the error taxonomy and
//! configuration types live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod config;
pub mod entities;
pub mod error;

pub use config::{CacheConfig, RouteCacheOptions};
pub use entities::{
    BrowserFeatureAvailability, BrowserFeatureAvailabilityKey, ChromiumDailyUsageStat,
    ChromiumDailyUsageStatKey, FeatureDetails, StoredBrowserFeatureAvailability,
    StoredChromiumDailyUsageStat, UsageStatsPage, WebFeature, WebFeatureKey,
};
pub use error::{
    CacheError, CacheResult, ConfigError, StorageError, StorageResult, WebstatusError,
    WebstatusResult,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Internal surrogate identifier of a web feature row.
///
/// Never exposed as a natural key; callers address features by their
/// external feature key and the storage client resolves this id.
pub type WebFeatureId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new internal web feature id (UUIDv7, timestamp-sortable).
pub fn new_web_feature_id() -> WebFeatureId {
    Uuid::now_v7()
}

// ============================================================================
// ENTITY KINDS
// ============================================================================

/// Entity kind discriminator, used for error reporting and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    WebFeature,
    BrowserFeatureAvailability,
    ChromiumDailyUsageStat,
}

impl EntityKind {
    /// Human readable name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::WebFeature => "web_feature",
            EntityKind::BrowserFeatureAvailability => "browser_feature_availability",
            EntityKind::ChromiumDailyUsageStat => "chromium_daily_usage_stat",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::WebFeature.to_string(), "web_feature");
        assert_eq!(
            EntityKind::BrowserFeatureAvailability.to_string(),
            "browser_feature_availability"
        );
        assert_eq!(
            EntityKind::ChromiumDailyUsageStat.to_string(),
            "chromium_daily_usage_stat"
        );
    }

    #[test]
    fn test_new_web_feature_ids_are_unique() {
        let a = new_web_feature_id();
        let b = new_web_feature_id();
        assert_ne!(a, b);
    }
}
