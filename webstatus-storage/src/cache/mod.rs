//! Request-keyed response cache.
//!
//! Handlers consult an [`OperationResponseCache`] before doing any storage
//! work and offer the computed response back to it afterwards. The cache is
//! advisory: a miss, a backend error, a timeout or an undecodable payload all
//! look the same to the caller, which simply computes the response again.
//!
//! # Keys
//!
//! A [`CacheKey`] is the operation id, a dash, and the JSON encoding of the
//! request descriptor. Identical requests to the same operation always map
//! to the same key; anything that changes the response must be part of the
//! descriptor.
//!
//! # Backends
//!
//! Backends implement [`RawBytesDataCacher`] and only ever see opaque bytes:
//!
//! - [`LmdbBytesCache`] persists entries in an LMDB environment.
//! - [`InMemoryBytesCache`] keeps entries in process memory.
//!
//! # Example
//!
//! ```ignore
//! let cache = OperationResponseCache::<GetFeatureRequest, FeatureResponse>::new(
//!     "getFeature",
//!     cacher,
//!     CacheConfig::default(),
//! );
//!
//! if let Some(resp) = cache.lookup(&request).await {
//!     return resp;
//! }
//! let resp = compute(&request).await?;
//! cache.attempt_cache(&request, &resp).await;
//! ```

pub mod key;
pub mod lmdb_backend;
pub mod memory_backend;
pub mod operation;
pub mod traits;

pub use key::CacheKey;
pub use lmdb_backend::LmdbBytesCache;
pub use memory_backend::InMemoryBytesCache;
pub use operation::{OperationCacheStats, OperationResponseCache, DEFAULT_CACHE_CALL_TIMEOUT};
pub use traits::{CacheStats, RawBytesDataCacher};
