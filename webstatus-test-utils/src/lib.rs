//! webstatus Test Utilities
//!
//! Centralized test infrastructure for the webstatus workspace:
//! - Proptest generators for entity types
//! - Scripted cache backends for exercising cache fallbacks
//! - Test fixtures for common scenarios
//! - Custom assertions for storage errors

pub use webstatus_core::{
    BrowserFeatureAvailability, CacheConfig, CacheError, CacheResult, ChromiumDailyUsageStat,
    EntityKind, StorageError, StorageResult, StoredBrowserFeatureAvailability,
    StoredChromiumDailyUsageStat, WebFeature, WebFeatureId,
};
pub use webstatus_storage::{CacheStats, InMemoryBytesCache, InMemoryStore, RawBytesDataCacher};

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

// ============================================================================
// MOCK CACHE BACKENDS
// ============================================================================

/// One call observed by a [`RecordingCacher`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheCall {
    Get { key: String },
    Put { key: String, value: Vec<u8>, config: CacheConfig },
}

/// Cache backend that forwards to an [`InMemoryBytesCache`] and records
/// every call, so tests can assert on exact keys and payloads.
#[derive(Debug, Default)]
pub struct RecordingCacher {
    inner: InMemoryBytesCache,
    calls: Mutex<Vec<CacheCall>>,
}

impl RecordingCacher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<CacheCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Keys passed to `get`, in order.
    pub fn get_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CacheCall::Get { key } => Some(key),
                CacheCall::Put { .. } => None,
            })
            .collect()
    }

    /// `(key, payload)` of every `cache` call, in order.
    pub fn puts(&self) -> Vec<(String, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CacheCall::Put { key, value, .. } => Some((key, value)),
                CacheCall::Get { .. } => None,
            })
            .collect()
    }

    fn record(&self, call: CacheCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl RawBytesDataCacher for RecordingCacher {
    async fn cache(&self, key: &str, value: Vec<u8>, config: &CacheConfig) -> CacheResult<()> {
        self.record(CacheCall::Put {
            key: key.to_string(),
            value: value.clone(),
            config: *config,
        });
        self.inner.cache(key, value, config).await
    }

    async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
        self.record(CacheCall::Get {
            key: key.to_string(),
        });
        self.inner.get(key).await
    }

    async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}

/// Cache backend whose every call fails with a backend error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingCacher;

#[async_trait]
impl RawBytesDataCacher for FailingCacher {
    async fn cache(&self, _key: &str, _value: Vec<u8>, _config: &CacheConfig) -> CacheResult<()> {
        Err(CacheError::Backend {
            reason: "cache unavailable".to_string(),
        })
    }

    async fn get(&self, _key: &str) -> CacheResult<Vec<u8>> {
        Err(CacheError::Backend {
            reason: "cache unavailable".to_string(),
        })
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Cache backend that sleeps before delegating to an in-memory cache.
#[derive(Debug, Default)]
pub struct SlowCacher {
    delay: Duration,
    inner: InMemoryBytesCache,
}

impl SlowCacher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: InMemoryBytesCache::new(),
        }
    }
}

#[async_trait]
impl RawBytesDataCacher for SlowCacher {
    async fn cache(&self, key: &str, value: Vec<u8>, config: &CacheConfig) -> CacheResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.cache(key, value, config).await
    }

    async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating webstatus entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a feature key in the web-features naming style.
    pub fn arb_feature_key() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,10}(-[a-z0-9]{1,6}){0,2}"
    }

    pub fn arb_browser_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("chrome".to_string()),
            Just("edge".to_string()),
            Just("firefox".to_string()),
            Just("safari".to_string()),
            "[a-z_]{1,12}",
        ]
    }

    pub fn arb_browser_version() -> impl Strategy<Value = String> {
        (1u32..200).prop_map(|v| v.to_string())
    }

    /// Generate a calendar date between 2000 and 2030.
    pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..11_000).prop_map(|days| {
            fixtures::date(2000, 1, 1) + chrono::Days::new(days as u64)
        })
    }

    /// Generate a usage fraction in [0, 1].
    pub fn arb_usage() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    pub fn arb_web_feature() -> impl Strategy<Value = WebFeature> {
        (arb_uuid(), arb_feature_key(), "[A-Za-z ]{1,30}").prop_map(|(id, feature_key, name)| {
            WebFeature {
                id,
                feature_key,
                name,
            }
        })
    }

    pub fn arb_browser_availability() -> impl Strategy<Value = BrowserFeatureAvailability> {
        (arb_browser_name(), arb_browser_version()).prop_map(|(browser_name, browser_version)| {
            BrowserFeatureAvailability {
                browser_name,
                browser_version,
            }
        })
    }

    pub fn arb_usage_stat() -> impl Strategy<Value = ChromiumDailyUsageStat> {
        (arb_date(), arb_usage()).prop_map(|(date, usage)| ChromiumDailyUsageStat { date, usage })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Calendar date; panics on an invalid date.
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
    }

    /// A feature with a fresh internal id.
    pub fn web_feature(feature_key: &str, name: &str) -> WebFeature {
        WebFeature {
            id: webstatus_core::new_web_feature_id(),
            feature_key: feature_key.to_string(),
            name: name.to_string(),
        }
    }

    pub fn availability(browser_name: &str, browser_version: &str) -> BrowserFeatureAvailability {
        BrowserFeatureAvailability {
            browser_name: browser_name.to_string(),
            browser_version: browser_version.to_string(),
        }
    }

    pub fn usage(date: NaiveDate, usage: f64) -> ChromiumDailyUsageStat {
        ChromiumDailyUsageStat { date, usage }
    }

    /// A cache config with the given TTL in seconds.
    pub fn cache_config(ttl_secs: u64) -> CacheConfig {
        CacheConfig::new(Duration::from_secs(ttl_secs))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for webstatus-specific validation.

    use super::*;

    /// Assert that a StorageResult is a NotFound error for `kind`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &StorageResult<T>, kind: EntityKind) {
        match result {
            Err(StorageError::NotFound { kind: k, .. }) => {
                assert_eq!(*k, kind, "Wrong entity kind in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", kind, other),
        }
    }

    /// Assert that a StorageResult is a ContractViolation error.
    #[track_caller]
    pub fn assert_contract_violation<T: std::fmt::Debug>(result: &StorageResult<T>) {
        match result {
            Err(StorageError::ContractViolation { .. }) => {}
            other => panic!("Expected ContractViolation error, got: {:?}", other),
        }
    }
}
