//! Per-operation response cache.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use webstatus_core::{CacheConfig, CacheError};

use super::key::CacheKey;
use super::traits::RawBytesDataCacher;

/// Upper bound on a single backend call made by an operation cache.
pub const DEFAULT_CACHE_CALL_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    stores: AtomicU64,
    store_failures: AtomicU64,
}

/// Outcome counts for one operation cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that failed for any reason other than a plain miss.
    pub errors: u64,
    pub stores: u64,
    pub store_failures: u64,
}

/// Response cache for one operation.
///
/// `K` is the request descriptor the key is derived from and `V` the
/// response stored as JSON. Neither method ever fails: every cache problem
/// is logged and turned into a miss or a skipped store, so a broken or slow
/// cache costs at most one timeout per call.
pub struct OperationResponseCache<K, V> {
    operation_id: String,
    cacher: Arc<dyn RawBytesDataCacher>,
    config: CacheConfig,
    timeout: Duration,
    counters: Arc<Counters>,
    _types: PhantomData<fn(&K) -> V>,
}

impl<K, V> Clone for OperationResponseCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            operation_id: self.operation_id.clone(),
            cacher: Arc::clone(&self.cacher),
            config: self.config,
            timeout: self.timeout,
            counters: Arc::clone(&self.counters),
            _types: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for OperationResponseCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationResponseCache")
            .field("operation_id", &self.operation_id)
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<K, V> OperationResponseCache<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    pub fn new(
        operation_id: impl Into<String>,
        cacher: Arc<dyn RawBytesDataCacher>,
        config: CacheConfig,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            cacher,
            config,
            timeout: DEFAULT_CACHE_CALL_TIMEOUT,
            counters: Arc::new(Counters::default()),
            _types: PhantomData,
        }
    }

    /// Set the bound applied to each backend call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn key_for(&self, request: &K) -> Result<CacheKey, CacheError> {
        CacheKey::derive(&self.operation_id, request)
    }

    /// Cached response for `request`, or `None` on any kind of miss.
    pub async fn lookup(&self, request: &K) -> Option<V> {
        let key = match self.key_for(request) {
            Ok(key) => key,
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(operation = %self.operation_id, error = %e, "unable to derive cache key");
                return None;
            }
        };

        let result = match tokio::time::timeout(self.timeout, self.cacher.get(key.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                millis: self.timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(bytes) => match serde_json::from_slice::<V>(&bytes) {
                Ok(value) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(operation = %self.operation_id, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(operation = %self.operation_id, key = %key, error = %e, "unable to decode cached response");
                    None
                }
            },
            Err(CacheError::NotFound) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(operation = %self.operation_id, "cache miss");
                None
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(operation = %self.operation_id, key = %key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Store `response` for `request`. Failures are logged, never returned.
    pub async fn attempt_cache(&self, request: &K, response: &V) {
        let prepared = self
            .key_for(request)
            .and_then(|key| Ok((key, serde_json::to_vec(response)?)));
        let (key, bytes) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.counters.store_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(operation = %self.operation_id, error = %e, "unable to encode response for cache");
                return;
            }
        };

        let put = self.cacher.cache(key.as_str(), bytes, &self.config);
        let result = match tokio::time::timeout(self.timeout, put).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                millis: self.timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(()) => {
                self.counters.stores.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.store_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(operation = %self.operation_id, key = %key, error = %e, "unable to cache response");
            }
        }
    }

    pub fn stats(&self) -> OperationCacheStats {
        OperationCacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            stores: self.counters.stores.load(Ordering::Relaxed),
            store_failures: self.counters.store_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory_backend::InMemoryBytesCache;
    use crate::cache::traits::CacheStats;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::Mutex;
    use webstatus_core::CacheResult;

    #[derive(Debug, Serialize)]
    struct Request {
        feature_id: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Response {
        name: String,
    }

    fn request() -> Request {
        Request {
            feature_id: "grid".to_string(),
        }
    }

    fn response() -> Response {
        Response {
            name: "Grid".to_string(),
        }
    }

    /// Backend that fails every call and records the keys it saw.
    #[derive(Default)]
    struct BrokenCacher {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RawBytesDataCacher for BrokenCacher {
        async fn cache(&self, key: &str, _value: Vec<u8>, _config: &CacheConfig) -> CacheResult<()> {
            self.seen.lock().unwrap().push(key.to_string());
            Err(CacheError::Backend {
                reason: "down".to_string(),
            })
        }

        async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
            self.seen.lock().unwrap().push(key.to_string());
            Err(CacheError::Backend {
                reason: "down".to_string(),
            })
        }

        async fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    /// Backend that never answers.
    struct HangingCacher;

    #[async_trait]
    impl RawBytesDataCacher for HangingCacher {
        async fn cache(&self, _key: &str, _value: Vec<u8>, _config: &CacheConfig) -> CacheResult<()> {
            std::future::pending().await
        }

        async fn get(&self, _key: &str) -> CacheResult<Vec<u8>> {
            std::future::pending().await
        }

        async fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    fn cache_over(cacher: Arc<dyn RawBytesDataCacher>) -> OperationResponseCache<Request, Response> {
        OperationResponseCache::new("getFeature", cacher, CacheConfig::default())
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = cache_over(Arc::new(InMemoryBytesCache::new()));
        assert_eq!(cache.lookup(&request()).await, None);

        cache.attempt_cache(&request(), &response()).await;
        assert_eq!(cache.lookup(&request()).await, Some(response()));

        let stats = cache.stats();
        assert_eq!((stats.misses, stats.hits, stats.stores), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_backend_errors_are_swallowed() {
        let backend = Arc::new(BrokenCacher::default());
        let cache = cache_over(backend.clone());

        assert_eq!(cache.lookup(&request()).await, None);
        cache.attempt_cache(&request(), &response()).await;

        let stats = cache.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.store_failures, 1);

        // Both calls used the same key.
        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0], r#"getFeature-{"feature_id":"grid"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_degrades_to_miss() {
        let cache = cache_over(Arc::new(HangingCacher)).with_timeout(Duration::from_millis(50));
        assert_eq!(cache.lookup(&request()).await, None);
        cache.attempt_cache(&request(), &response()).await;

        let stats = cache.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.store_failures, 1);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_miss() {
        let backend = Arc::new(InMemoryBytesCache::new());
        let cache = cache_over(backend.clone());
        let key = cache.key_for(&request()).unwrap();
        backend
            .cache(key.as_str(), b"not json".to_vec(), &CacheConfig::default())
            .await
            .unwrap();

        assert_eq!(cache.lookup(&request()).await, None);
        assert_eq!(cache.stats().errors, 1);
    }

    #[tokio::test]
    async fn test_operations_do_not_share_entries() {
        let backend: Arc<dyn RawBytesDataCacher> = Arc::new(InMemoryBytesCache::new());
        let get_feature = cache_over(Arc::clone(&backend));
        let other: OperationResponseCache<Request, Response> =
            OperationResponseCache::new("listFeatures", backend, CacheConfig::default());

        get_feature.attempt_cache(&request(), &response()).await;
        assert_eq!(other.lookup(&request()).await, None);
    }
}
