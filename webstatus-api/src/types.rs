//! Request descriptors and response bodies.
//!
//! Request descriptors double as response cache keys, so their serialized
//! form is part of the cache contract: the path parameter comes first as
//! `feature_id`, query parameters follow under `Params` in declaration
//! order, and absent optional parameters are omitted.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use webstatus_core::{ChromiumDailyUsageStat, FeatureDetails, UsageStatsPage};

// ============================================================================
// GET FEATURE
// ============================================================================

/// Query parameters of `GET /v1/features/{feature_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFeatureParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetFeatureRequest {
    pub feature_id: String,
    #[serde(rename = "Params")]
    pub params: GetFeatureParams,
}

/// Implementation of a feature in one browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserImplementation {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureResponse {
    pub feature_id: String,
    pub name: String,
    /// Keyed by browser name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub browser_implementations: BTreeMap<String, BrowserImplementation>,
}

impl From<FeatureDetails> for FeatureResponse {
    fn from(details: FeatureDetails) -> Self {
        let browser_implementations = details
            .browser_implementations
            .into_iter()
            .map(|a| {
                (
                    a.browser_name,
                    BrowserImplementation {
                        status: "available".to_string(),
                        version: a.browser_version,
                    },
                )
            })
            .collect();
        Self {
            feature_id: details.feature_key,
            name: details.name,
            browser_implementations,
        }
    }
}

// ============================================================================
// CHROME DAILY USAGE
// ============================================================================

/// Page size used when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters of the daily Chrome usage route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChromeDailyUsageStatsParams {
    #[serde(rename = "startAt")]
    pub start_at: NaiveDate,
    #[serde(rename = "endAt")]
    pub end_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListChromeDailyUsageStatsRequest {
    pub feature_id: String,
    #[serde(rename = "Params")]
    pub params: ListChromeDailyUsageStatsParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeUsageStat {
    pub timestamp: DateTime<Utc>,
    pub usage: Option<f64>,
}

impl From<ChromiumDailyUsageStat> for ChromeUsageStat {
    fn from(stat: ChromiumDailyUsageStat) -> Self {
        Self {
            timestamp: stat.date.and_time(NaiveTime::MIN).and_utc(),
            usage: Some(stat.usage),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeUsageStatsPage {
    pub data: Vec<ChromeUsageStat>,
    pub metadata: PageMetadata,
}

impl From<UsageStatsPage> for ChromeUsageStatsPage {
    fn from(page: UsageStatsPage) -> Self {
        Self {
            data: page.stats.into_iter().map(Into::into).collect(),
            metadata: PageMetadata {
                next_page_token: page.next_page_token,
            },
        }
    }
}
