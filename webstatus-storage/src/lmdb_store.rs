//! LMDB-backed store.
//!
//! Uses the heed crate (Rust bindings for LMDB). Every table is a named
//! database whose values are JSON rows. The LMDB key is the SHA-256 digest of
//! the canonical primary-key encoding, which keeps it under LMDB's key size
//! limit however long the key columns are. The key columns themselves stay in
//! the row.
//!
//! Statements whose equality predicates cover a table's key columns are read
//! with a single `get`. Anything else scans the table.
//!
//! # Transactions
//!
//! LMDB allows a single writer at a time, so every `read_write` call is
//! serializable with respect to every other. Reads inside the transaction run
//! on the write transaction itself and observe committed state only, because
//! mutations are buffered until the body returns. A write transaction that is
//! dropped without `commit` is aborted by LMDB.
//!
//! heed transactions are blocking and bound to the thread that opened them,
//! so all LMDB work runs on tokio's blocking pool.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use sha2::{Digest, Sha256};
use webstatus_core::{StorageError, StorageResult};

use crate::statement::{encode_key, Mutation, Row, Statement, TableSchema};
use crate::store::{panic_message, ReadWriteTransaction, Store};

#[derive(Clone, Copy)]
struct Table {
    db: Database<Bytes, Bytes>,
    key_columns: &'static [&'static str],
}

type Tables = HashMap<String, Table>;

/// LMDB key of the row with primary key `key`.
fn row_key(key: &Row) -> StorageResult<Vec<u8>> {
    Ok(Sha256::digest(encode_key(key)?).to_vec())
}

fn txn_error(e: heed::Error) -> StorageError {
    StorageError::TransactionFailed {
        reason: e.to_string(),
    }
}

fn query_error(table: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::QueryFailed {
        table: table.to_string(),
        reason: e.to_string(),
    }
}

/// LMDB-backed store with one named database per table.
#[derive(Clone)]
pub struct LmdbStore {
    env: Env,
    tables: Arc<Tables>,
}

impl std::fmt::Debug for LmdbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbStore")
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LmdbStore {
    /// Open (or create) a store at `path` with the given tables.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the memory map in megabytes
    /// * `tables` - Table schemas; statements against any other table fail
    pub fn open<P: AsRef<Path>>(
        path: P,
        max_size_mb: usize,
        tables: &[TableSchema],
    ) -> StorageResult<Self> {
        std::fs::create_dir_all(&path).map_err(|e| StorageError::TransactionFailed {
            reason: format!("failed to create store directory: {e}"),
        })?;

        // SAFETY: the environment is opened once per directory by this
        // process; heed requires the caller to uphold that.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(tables.len() as u32)
                .open(path.as_ref())
        }
        .map_err(txn_error)?;

        let mut wtxn = env.write_txn().map_err(txn_error)?;
        let mut opened = Tables::new();
        for schema in tables {
            let db: Database<Bytes, Bytes> = env
                .create_database(&mut wtxn, Some(schema.name))
                .map_err(txn_error)?;
            opened.insert(
                schema.name.to_string(),
                Table {
                    db,
                    key_columns: schema.key_columns,
                },
            );
        }
        wtxn.commit().map_err(txn_error)?;

        Ok(Self {
            env,
            tables: Arc::new(opened),
        })
    }

    /// Open a store with every table used by the webstatus mappers.
    pub fn open_default<P: AsRef<Path>>(path: P, max_size_mb: usize) -> StorageResult<Self> {
        Self::open(path, max_size_mb, crate::mappers::ALL_TABLES)
    }

    /// Number of rows in `table`.
    pub async fn row_count(&self, table: &str) -> StorageResult<u64> {
        let env = self.env.clone();
        let db = database(&self.tables, table)?.db;
        let table = table.to_string();
        run_blocking(move || {
            let rtxn = env.read_txn().map_err(txn_error)?;
            db.len(&rtxn).map_err(|e| query_error(&table, e))
        })
        .await
    }
}

fn database(tables: &Tables, table: &str) -> StorageResult<Table> {
    tables
        .get(table)
        .copied()
        .ok_or_else(|| query_error(table, "unknown table"))
}

fn scan(txn: &RoTxn<'_>, table: Table, statement: &Statement) -> StorageResult<Vec<Row>> {
    let name = statement.table();
    if let Some(key) = statement.key_projection(table.key_columns) {
        let found = table
            .db
            .get(txn, row_key(&key)?.as_slice())
            .map_err(|e| query_error(name, e))?;
        let rows = match found {
            Some(bytes) => vec![serde_json::from_slice::<Row>(bytes)?],
            None => Vec::new(),
        };
        return Ok(statement.apply(rows.iter()));
    }

    let mut rows = Vec::new();
    for entry in table.db.iter(txn).map_err(|e| query_error(name, e))? {
        let (_, bytes) = entry.map_err(|e| query_error(name, e))?;
        let row: Row = serde_json::from_slice(bytes)?;
        if statement.matches(&row) {
            rows.push(row);
        }
    }
    Ok(statement.apply(rows.iter()))
}

async fn run_blocking<T, F>(f: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StorageResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::TransactionFailed {
            reason: if e.is_panic() {
                panic_message(e.into_panic().as_ref())
            } else {
                e.to_string()
            },
        })?
}

struct LmdbTransaction<'a, 'e> {
    wtxn: &'a RwTxn<'e>,
    tables: &'a Tables,
    writes: Vec<Mutation>,
}

impl ReadWriteTransaction for LmdbTransaction<'_, '_> {
    fn query(&mut self, statement: &Statement) -> StorageResult<Vec<Row>> {
        let db = database(self.tables, statement.table())?;
        scan(self.wtxn, db, statement)
    }

    fn buffer_write(&mut self, mutation: Mutation) {
        self.writes.push(mutation);
    }
}

#[async_trait]
impl Store for LmdbStore {
    async fn single_read(&self, statement: &Statement) -> StorageResult<Vec<Row>> {
        let env = self.env.clone();
        let db = database(&self.tables, statement.table())?;
        let statement = statement.clone();
        run_blocking(move || {
            let rtxn = env.read_txn().map_err(txn_error)?;
            scan(&rtxn, db, &statement)
        })
        .await
    }

    async fn read_write<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn ReadWriteTransaction) -> StorageResult<T> + Send + 'static,
    {
        let env = self.env.clone();
        let tables = Arc::clone(&self.tables);
        run_blocking(move || {
            let mut wtxn = env.write_txn().map_err(txn_error)?;

            let (outcome, writes) = {
                let mut txn = LmdbTransaction {
                    wtxn: &wtxn,
                    tables: &tables,
                    writes: Vec::new(),
                };
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| f(&mut txn)));
                (outcome, txn.writes)
            };

            let value = match outcome {
                Ok(result) => result?,
                Err(payload) => {
                    return Err(StorageError::TransactionFailed {
                        reason: panic_message(payload.as_ref()),
                    })
                }
            };

            for mutation in writes {
                let Mutation::InsertOrUpdate { table, key, row } = mutation;
                let db = database(&tables, &table)?.db;
                let key = row_key(&key)?;
                let bytes = serde_json::to_vec(&row)?;
                db.put(&mut wtxn, key.as_slice(), bytes.as_slice())
                    .map_err(|e| query_error(&table, e))?;
            }
            wtxn.commit().map_err(txn_error)?;
            Ok(value)
        })
        .await
    }
}
