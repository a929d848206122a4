//! Core entity structures
//!
//! Stored rows use PascalCase column names so that every row serializes to
//! the same column layout regardless of which store persists it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::WebFeatureId;

// ============================================================================
// WEB FEATURES
// ============================================================================

/// A web platform feature, addressed externally by its feature key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebFeature {
    /// Internal surrogate id. Preserved across upserts once assigned.
    #[serde(rename = "ID")]
    pub id: WebFeatureId,
    #[serde(rename = "FeatureKey")]
    pub feature_key: String,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Natural key of a [`WebFeature`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebFeatureKey {
    #[serde(rename = "FeatureKey")]
    pub feature_key: String,
}

impl WebFeatureKey {
    pub fn new(feature_key: impl Into<String>) -> Self {
        Self {
            feature_key: feature_key.into(),
        }
    }
}

// ============================================================================
// BROWSER AVAILABILITY
// ============================================================================

/// Availability information for a feature in a particular browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserFeatureAvailability {
    pub browser_name: String,
    pub browser_version: String,
}

/// Stored row for a browser availability fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBrowserFeatureAvailability {
    #[serde(rename = "WebFeatureID")]
    pub web_feature_id: WebFeatureId,
    #[serde(rename = "BrowserName")]
    pub browser_name: String,
    #[serde(rename = "BrowserVersion")]
    pub browser_version: String,
}

impl StoredBrowserFeatureAvailability {
    pub fn new(web_feature_id: WebFeatureId, availability: BrowserFeatureAvailability) -> Self {
        Self {
            web_feature_id,
            browser_name: availability.browser_name,
            browser_version: availability.browser_version,
        }
    }
}

impl From<StoredBrowserFeatureAvailability> for BrowserFeatureAvailability {
    fn from(stored: StoredBrowserFeatureAvailability) -> Self {
        Self {
            browser_name: stored.browser_name,
            browser_version: stored.browser_version,
        }
    }
}

/// Natural key of a browser availability fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowserFeatureAvailabilityKey {
    #[serde(rename = "WebFeatureID")]
    pub web_feature_id: WebFeatureId,
    #[serde(rename = "BrowserName")]
    pub browser_name: String,
}

// ============================================================================
// CHROMIUM USAGE
// ============================================================================

/// One day of Chromium usage for a feature. `usage` is a fraction in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromiumDailyUsageStat {
    pub date: NaiveDate,
    pub usage: f64,
}

/// Stored row for a daily Chromium usage metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChromiumDailyUsageStat {
    #[serde(rename = "WebFeatureID")]
    pub web_feature_id: WebFeatureId,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Usage")]
    pub usage: f64,
}

impl StoredChromiumDailyUsageStat {
    pub fn new(web_feature_id: WebFeatureId, stat: ChromiumDailyUsageStat) -> Self {
        Self {
            web_feature_id,
            date: stat.date,
            usage: stat.usage,
        }
    }
}

impl From<StoredChromiumDailyUsageStat> for ChromiumDailyUsageStat {
    fn from(stored: StoredChromiumDailyUsageStat) -> Self {
        Self {
            date: stored.date,
            usage: stored.usage,
        }
    }
}

/// Natural key of a daily Chromium usage metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChromiumDailyUsageStatKey {
    #[serde(rename = "WebFeatureID")]
    pub web_feature_id: WebFeatureId,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
}

/// A page of usage stats, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStatsPage {
    pub stats: Vec<ChromiumDailyUsageStat>,
    pub next_page_token: Option<String>,
}

// ============================================================================
// READ MODELS
// ============================================================================

/// Aggregated view of a feature returned by feature lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDetails {
    pub feature_key: String,
    pub name: String,
    pub browser_implementations: Vec<BrowserFeatureAvailability>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_stored_availability_columns() {
        let row = StoredBrowserFeatureAvailability {
            web_feature_id: Uuid::nil(),
            browser_name: "chrome".to_string(),
            browser_version: "120".to_string(),
        };
        let value = serde_json::to_value(&row).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("WebFeatureID"));
        assert_eq!(obj["BrowserName"], "chrome");
        assert_eq!(obj["BrowserVersion"], "120");
    }

    #[test]
    fn test_usage_date_serializes_as_iso_date() {
        let row = StoredChromiumDailyUsageStat {
            web_feature_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            usage: 0.5,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["Date"], "2000-01-01");
    }

    #[test]
    fn test_stored_availability_converts_back() {
        let input = BrowserFeatureAvailability {
            browser_name: "firefox".to_string(),
            browser_version: "119".to_string(),
        };
        let stored = StoredBrowserFeatureAvailability::new(Uuid::nil(), input.clone());
        assert_eq!(BrowserFeatureAvailability::from(stored), input);
    }
}
