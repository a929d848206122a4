//! LMDB-backed response cache.
//!
//! Uses the heed crate (Rust bindings for LMDB) to keep cached responses in
//! a memory-mapped file that survives process restarts.
//!
//! # Value Layout
//!
//! `[expires_at: 8 bytes, i64 LE unix millis][payload]`
//!
//! Entries are stored under the SHA-256 digest of the cache key, since
//! request-derived keys can exceed LMDB's key size limit.
//!
//! Expired entries stay on disk until overwritten or removed by
//! [`LmdbBytesCache::purge_expired`], but always read as not found.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The backend uses:
//! - Read transactions for `get`
//! - Write transactions for `cache` and `purge_expired`
//! - Statistics behind a lock, updated after each call
//!
//! `get` and `cache` run on tokio's blocking pool. A put may wait on LMDB's
//! writer lock and commit fsync, and callers bound each call with a timeout
//! that must be able to fire meanwhile.

use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use sha2::{Digest, Sha256};
use webstatus_core::{CacheConfig, CacheError, CacheResult};

use super::traits::{CacheStats, RawBytesDataCacher};

const EXPIRY_PREFIX_LEN: usize = 8;

fn backend_error(e: impl std::fmt::Display) -> CacheError {
    CacheError::Backend {
        reason: e.to_string(),
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn entry_key(key: &str) -> Vec<u8> {
    Sha256::digest(key.as_bytes()).to_vec()
}

fn update_stats(stats: &RwLock<CacheStats>, f: impl FnOnce(&mut CacheStats)) {
    if let Ok(mut stats) = stats.write() {
        f(&mut stats);
    }
}

async fn run_blocking<T, F>(f: F) -> CacheResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> CacheResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(backend_error)?
}

/// Split a stored value into its expiry and payload.
fn split_entry(bytes: &[u8]) -> CacheResult<(i64, &[u8])> {
    if bytes.len() < EXPIRY_PREFIX_LEN {
        return Err(backend_error("stored entry is shorter than its expiry prefix"));
    }
    let (prefix, payload) = bytes.split_at(EXPIRY_PREFIX_LEN);
    let expires_at: [u8; EXPIRY_PREFIX_LEN] = prefix
        .try_into()
        .map_err(|_| backend_error("invalid expiry prefix"))?;
    Ok((i64::from_le_bytes(expires_at), payload))
}

/// LMDB-backed [`RawBytesDataCacher`].
///
/// # Example
///
/// ```ignore
/// use webstatus_storage::cache::LmdbBytesCache;
///
/// let cache = LmdbBytesCache::new("/var/lib/webstatus/cache", 256)?;
/// cache.cache("getFeature-{...}", bytes, &CacheConfig::default()).await?;
/// ```
pub struct LmdbBytesCache {
    env: Env,
    db: Database<Bytes, Bytes>,
    stats: Arc<RwLock<CacheStats>>,
}

impl std::fmt::Debug for LmdbBytesCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbBytesCache").finish_non_exhaustive()
    }
}

impl LmdbBytesCache {
    /// Create a new LMDB cache.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] if the directory cannot be created or
    /// the environment cannot be opened.
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> CacheResult<Self> {
        std::fs::create_dir_all(&path).map_err(backend_error)?;

        // SAFETY: one environment per directory per process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(backend_error)?;

        let mut wtxn = env.write_txn().map_err(backend_error)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(backend_error)?;
        wtxn.commit().map_err(backend_error)?;

        let entry_count = {
            let rtxn = env.read_txn().map_err(backend_error)?;
            db.len(&rtxn).map_err(backend_error)?
        };

        Ok(Self {
            env,
            db,
            stats: Arc::new(RwLock::new(CacheStats {
                entry_count,
                ..Default::default()
            })),
        })
    }

    /// Delete every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> CacheResult<u64> {
        let now = now_millis();
        let expired: Vec<Vec<u8>> = {
            let rtxn = self.env.read_txn().map_err(backend_error)?;
            let mut keys = Vec::new();
            for entry in self.db.iter(&rtxn).map_err(backend_error)? {
                let (key, bytes) = entry.map_err(backend_error)?;
                let is_expired = split_entry(bytes)
                    .map(|(expires_at, _)| expires_at <= now)
                    .unwrap_or(true);
                if is_expired {
                    keys.push(key.to_vec());
                }
            }
            keys
        };

        let mut wtxn = self.env.write_txn().map_err(backend_error)?;
        let mut deleted = 0u64;
        for key in &expired {
            if self.db.delete(&mut wtxn, key).map_err(backend_error)? {
                deleted += 1;
            }
        }
        wtxn.commit().map_err(backend_error)?;

        update_stats(&self.stats, |stats| {
            stats.entry_count = stats.entry_count.saturating_sub(deleted);
            stats.evictions += deleted;
        });
        tracing::debug!(deleted, "purged expired cache entries");
        Ok(deleted)
    }
}

#[async_trait]
impl RawBytesDataCacher for LmdbBytesCache {
    async fn cache(&self, key: &str, value: Vec<u8>, config: &CacheConfig) -> CacheResult<()> {
        let ttl_millis = i64::try_from(config.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_millis().saturating_add(ttl_millis);

        let mut entry = Vec::with_capacity(EXPIRY_PREFIX_LEN + value.len());
        entry.extend_from_slice(&expires_at.to_le_bytes());
        entry.extend_from_slice(&value);

        let env = self.env.clone();
        let db = self.db;
        let stats = Arc::clone(&self.stats);
        let key = entry_key(key);
        let payload_len = value.len() as u64;

        run_blocking(move || {
            let mut wtxn = env.write_txn().map_err(backend_error)?;
            let is_new = db
                .get(&wtxn, key.as_slice())
                .map_err(backend_error)?
                .is_none();
            db.put(&mut wtxn, key.as_slice(), &entry)
                .map_err(backend_error)?;
            wtxn.commit().map_err(backend_error)?;

            update_stats(&stats, |stats| {
                if is_new {
                    stats.entry_count += 1;
                }
                stats.memory_bytes += payload_len;
            });
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
        let env = self.env.clone();
        let db = self.db;
        let stats = Arc::clone(&self.stats);
        let key = entry_key(key);

        run_blocking(move || {
            let rtxn = env.read_txn().map_err(backend_error)?;
            let live = match db.get(&rtxn, key.as_slice()) {
                Ok(Some(bytes)) => {
                    let (expires_at, payload) = split_entry(bytes)?;
                    (expires_at > now_millis()).then(|| payload.to_vec())
                }
                Ok(None) => None,
                Err(e) => {
                    update_stats(&stats, |stats| stats.misses += 1);
                    return Err(backend_error(e));
                }
            };

            match live {
                Some(payload) => {
                    update_stats(&stats, |stats| stats.hits += 1);
                    Ok(payload)
                }
                None => {
                    update_stats(&stats, |stats| stats.misses += 1);
                    Err(CacheError::NotFound)
                }
            }
        })
        .await
    }

    async fn stats(&self) -> CacheStats {
        self.stats.read().map(|s| s.clone()).unwrap_or_default()
    }
}
