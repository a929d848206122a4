//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default TTL for cached operation responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Expiry policy handed to the cache backend on every put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time after which the entry reads as not-found.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

/// Cache expiry applied to the cached routes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCacheOptions {
    /// Used by every cached route.
    pub default: CacheConfig,
}

impl RouteCacheOptions {
    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default = CacheConfig::new(ttl);
        self
    }
}
