//! Server configuration loaded from `WEBSTATUS_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use webstatus_core::config::DEFAULT_CACHE_TTL;
use webstatus_core::{ConfigError, RouteCacheOptions};
use webstatus_storage::cache::DEFAULT_CACHE_CALL_TIMEOUT;

/// Which [`RawBytesDataCacher`](webstatus_storage::RawBytesDataCacher) backs
/// the response caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Lmdb,
    Memory,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lmdb" => Ok(Self::Lmdb),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'lmdb' or 'memory', got '{}'", other)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    /// Root directory for the LMDB store and cache.
    pub data_dir: PathBuf,
    pub cache_backend: CacheBackendKind,
    pub cache_ttl: Duration,
    /// Bound on each cache backend call.
    pub cache_timeout: Duration,
    pub lmdb_map_size_mb: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("./data"),
            cache_backend: CacheBackendKind::Lmdb,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_timeout: DEFAULT_CACHE_CALL_TIMEOUT,
            lmdb_map_size_mb: 1024,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Create AppConfig from environment variables.
    ///
    /// Environment variables:
    /// - `WEBSTATUS_LISTEN_ADDR`: Socket address to bind (default: 0.0.0.0:8080)
    /// - `WEBSTATUS_DATA_DIR`: Data directory (default: ./data)
    /// - `WEBSTATUS_CACHE_BACKEND`: "lmdb" or "memory" (default: lmdb)
    /// - `WEBSTATUS_CACHE_TTL_SECS`: Default response TTL (default: 300)
    /// - `WEBSTATUS_CACHE_TIMEOUT_MS`: Cache call timeout (default: 500)
    /// - `WEBSTATUS_LMDB_MAP_SIZE_MB`: LMDB map size (default: 1024)
    /// - `WEBSTATUS_LOG_FORMAT`: "json" for JSON logs, anything else for text
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = parse_or(&lookup, "WEBSTATUS_LISTEN_ADDR", defaults.listen_addr)?;
        let data_dir = lookup("WEBSTATUS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let cache_backend =
            parse_or(&lookup, "WEBSTATUS_CACHE_BACKEND", defaults.cache_backend)?;
        let cache_ttl = parse_or(&lookup, "WEBSTATUS_CACHE_TTL_SECS", defaults.cache_ttl.as_secs())
            .map(Duration::from_secs)?;
        let cache_timeout = parse_or(
            &lookup,
            "WEBSTATUS_CACHE_TIMEOUT_MS",
            defaults.cache_timeout.as_millis() as u64,
        )
        .map(Duration::from_millis)?;
        let lmdb_map_size_mb =
            parse_or(&lookup, "WEBSTATUS_LMDB_MAP_SIZE_MB", defaults.lmdb_map_size_mb)?;
        if lmdb_map_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "WEBSTATUS_LMDB_MAP_SIZE_MB".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let log_format = match lookup("WEBSTATUS_LOG_FORMAT") {
            Some(s) if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            data_dir,
            cache_backend,
            cache_ttl,
            cache_timeout,
            lmdb_map_size_mb,
            log_format,
        })
    }

    /// Cache TTLs of the cached routes.
    pub fn route_cache_options(&self) -> RouteCacheOptions {
        RouteCacheOptions::default().with_default_ttl(self.cache_ttl)
    }
}

fn parse_or<F, T>(lookup: &F, field: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(field) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}
