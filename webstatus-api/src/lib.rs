//! webstatus API - HTTP layer
//!
//! Axum handlers over the storage client, each fronted by a request-keyed
//! operation response cache. Also hosts configuration loading, tracing
//! initialization and the state wiring used by the server binary.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use webstatus_storage::{
    InMemoryBytesCache, LmdbBytesCache, LmdbStore, RawBytesDataCacher, StorageClient,
};

pub use config::{AppConfig, CacheBackendKind, LogFormat};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use state::{AppState, OperationResponseCaches};

/// Build the production state: an LMDB store under `data_dir/store` and the
/// configured cache backend.
pub fn build_state(config: &AppConfig) -> ApiResult<AppState<LmdbStore>> {
    let store = LmdbStore::open_default(config.data_dir.join("store"), config.lmdb_map_size_mb)
        .map_err(|e| ApiError::internal_error(format!("Failed to open store: {}", e)))?;

    let cacher: Arc<dyn RawBytesDataCacher> = match config.cache_backend {
        CacheBackendKind::Lmdb => Arc::new(
            LmdbBytesCache::new(config.data_dir.join("cache"), config.lmdb_map_size_mb)
                .map_err(|e| ApiError::internal_error(format!("Failed to open cache: {}", e)))?,
        ),
        CacheBackendKind::Memory => Arc::new(InMemoryBytesCache::new()),
    };

    let caches = OperationResponseCaches::new(
        cacher,
        &config.route_cache_options(),
        config.cache_timeout,
    );
    Ok(AppState::new(StorageClient::new(Arc::new(store)), caches))
}
