//! In-memory store for tests and local development.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use tokio::sync::Mutex;
use webstatus_core::{StorageError, StorageResult};

use crate::statement::{encode_key, Mutation, Row, Statement};
use crate::store::{panic_message, ReadWriteTransaction, Store};

type Table = BTreeMap<Vec<u8>, Row>;

/// In-memory store.
///
/// A single mutex guards every table, so read-write transactions are fully
/// serialized. Buffered writes are applied only after the transaction body
/// returns `Ok`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub async fn clear(&self) {
        self.tables.lock().await.clear();
    }

    /// Number of rows in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .await
            .get(table)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    /// All rows of `table` in primary key order.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .await
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Write a row directly, bypassing mappers. Intended for seeding fixtures.
    pub async fn insert_raw(&self, table: &str, key: Row, row: Row) -> StorageResult<()> {
        let mut tables = self.tables.lock().await;
        apply_mutations(&mut tables, vec![Mutation::insert_or_update(table, key, row)])
    }
}

struct MemoryTransaction<'a> {
    tables: &'a HashMap<String, Table>,
    writes: Vec<Mutation>,
}

impl ReadWriteTransaction for MemoryTransaction<'_> {
    fn query(&mut self, statement: &Statement) -> StorageResult<Vec<Row>> {
        Ok(match self.tables.get(statement.table()) {
            Some(table) => statement.apply(table.values()),
            None => Vec::new(),
        })
    }

    fn buffer_write(&mut self, mutation: Mutation) {
        self.writes.push(mutation);
    }
}

/// Encode every key first so a bad mutation cannot leave earlier ones applied.
fn apply_mutations(
    tables: &mut HashMap<String, Table>,
    mutations: Vec<Mutation>,
) -> StorageResult<()> {
    let encoded = mutations
        .into_iter()
        .map(|m| match m {
            Mutation::InsertOrUpdate { table, key, row } => {
                encode_key(&key).map(|k| (table, k, row))
            }
        })
        .collect::<StorageResult<Vec<_>>>()?;

    for (table, key, row) in encoded {
        tables.entry(table).or_default().insert(key, row);
    }
    Ok(())
}

#[async_trait]
impl Store for InMemoryStore {
    async fn single_read(&self, statement: &Statement) -> StorageResult<Vec<Row>> {
        let tables = self.tables.lock().await;
        Ok(match tables.get(statement.table()) {
            Some(table) => statement.apply(table.values()),
            None => Vec::new(),
        })
    }

    async fn read_write<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn ReadWriteTransaction) -> StorageResult<T> + Send + 'static,
    {
        let mut tables = self.tables.lock().await;

        let (outcome, writes) = {
            let mut txn = MemoryTransaction {
                tables: &tables,
                writes: Vec::new(),
            };
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| f(&mut txn)));
            (outcome, txn.writes)
        };

        match outcome {
            Ok(Ok(value)) => {
                let count = writes.len();
                apply_mutations(&mut tables, writes)?;
                tracing::trace!(mutations = count, "in-memory transaction committed");
                Ok(value)
            }
            Ok(Err(e)) => Err(e),
            Err(payload) => Err(StorageError::TransactionFailed {
                reason: panic_message(payload.as_ref()),
            }),
        }
    }
}
