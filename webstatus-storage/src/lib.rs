//! webstatus Storage - Entity Writer, Stores and Response Cache
//!
//! Typed data access for the webstatus entities. Every entity kind is
//! described by an [`EntityMapper`]; one generic [`EntityWriter`] performs the
//! read-modify-write upsert for all of them against any [`Store`]. The
//! [`cache`] module fronts expensive reads with a request-keyed response
//! cache.

pub mod cache;
pub mod client;
pub mod lmdb_store;
pub mod mapper;
pub mod mappers;
pub mod memory_store;
pub mod statement;
pub mod store;
pub mod writer;

pub use client::StorageClient;
pub use lmdb_store::LmdbStore;
pub use mapper::EntityMapper;
pub use mappers::{
    BrowserFeatureAvailabilityMapper, ChromiumDailyUsageStatMapper, WebFeatureMapper, ALL_TABLES,
};
pub use memory_store::InMemoryStore;
pub use statement::{Direction, Mutation, Predicate, Row, Statement, TableSchema};
pub use store::{ReadWriteTransaction, Store};
pub use writer::EntityWriter;

// Re-export cache types for API integration
pub use cache::{
    CacheKey, CacheStats, InMemoryBytesCache, LmdbBytesCache, OperationCacheStats,
    OperationResponseCache, RawBytesDataCacher,
};
