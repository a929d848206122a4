//! Cache backend trait.
//!
//! Backends store opaque bytes under string keys with a per-entry expiry.
//! They know nothing about operations or response types; encoding and key
//! derivation happen in [`OperationResponseCache`](super::OperationResponseCache).

use async_trait::async_trait;
use webstatus_core::{CacheConfig, CacheResult};

/// Byte-oriented cache backend.
///
/// # Implementation Requirements
///
/// - `get` returns [`CacheError::NotFound`] for absent and expired entries,
///   and any other error only for real backend failures.
/// - `cache` overwrites an existing entry and resets its expiry.
/// - Concurrent calls on the same key must be safe; last writer wins.
///
/// [`CacheError::NotFound`]: webstatus_core::CacheError::NotFound
#[async_trait]
pub trait RawBytesDataCacher: Send + Sync {
    /// Store `value` under `key`, expiring after `config.ttl`.
    async fn cache(&self, key: &str, value: Vec<u8>, config: &CacheConfig) -> CacheResult<()>;

    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> CacheResult<Vec<u8>>;

    /// Get cache statistics.
    async fn stats(&self) -> CacheStats;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, including expired entries.
    pub misses: u64,
    /// Number of entries currently stored, expired or not.
    pub entry_count: u64,
    /// Approximate payload size in bytes.
    pub memory_bytes: u64,
    /// Number of entries dropped because they expired.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
