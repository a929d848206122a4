//! Store boundary: single reads and atomic read-modify-write transactions.
//!
//! Entity writers and query methods only ever talk to a store through these
//! two traits, so the same upsert algorithm runs unchanged against the
//! in-memory store used in tests and the LMDB store used in production.

use async_trait::async_trait;
use webstatus_core::StorageResult;

use crate::statement::{Mutation, Row, Statement};

/// Operations available inside a read-write transaction.
///
/// Reads observe the state committed before the transaction started.
/// Buffered writes become visible only after the transaction commits.
pub trait ReadWriteTransaction {
    /// Run a statement against the transaction's snapshot.
    fn query(&mut self, statement: &Statement) -> StorageResult<Vec<Row>>;

    /// Buffer a mutation to apply on commit.
    fn buffer_write(&mut self, mutation: Mutation);
}

/// A strongly consistent store of rows grouped into tables.
///
/// Implementations must guarantee that two concurrent `read_write` calls
/// touching the same row are serialized, and that a transaction whose body
/// fails, panics or is dropped leaves no partial writes behind.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Execute one statement outside of any read-write transaction.
    async fn single_read(&self, statement: &Statement) -> StorageResult<Vec<Row>>;

    /// Execute `f` inside one atomic read-write transaction.
    ///
    /// The buffered mutations are committed only when `f` returns `Ok`.
    async fn read_write<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn ReadWriteTransaction) -> StorageResult<T> + Send + 'static;
}

/// Convert a panic payload into a readable message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "transaction body panicked".to_string()
    }
}
