//! Generic read-modify-write (upsert) engine.

use std::sync::Arc;

use webstatus_core::{StorageError, StorageResult};

use crate::mapper::EntityMapper;
use crate::statement::{to_row, Mutation, Row};
use crate::store::{ReadWriteTransaction, Store};

/// Upserts entities of one kind through its [`EntityMapper`].
///
/// Every upsert is a single read-write transaction: look the row up by
/// natural key, merge, write the merged row back. Concurrent upserts of the
/// same key are serialized by the store. The writer never retries.
pub struct EntityWriter<M, S> {
    store: Arc<S>,
    mapper: Arc<M>,
}

impl<M, S> EntityWriter<M, S>
where
    M: EntityMapper,
    S: Store,
{
    /// Create a writer using the mapper's default instance.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_mapper(store, Arc::new(M::default()))
    }

    /// Create a writer around a shared mapper instance.
    pub fn with_mapper(store: Arc<S>, mapper: Arc<M>) -> Self {
        Self {
            store,
            mapper,
        }
    }

    /// Get a reference to the mapper.
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Insert `incoming`, or merge it into the existing row with the same key.
    ///
    /// A missing row is not an error: the mapper merges against `None`.
    /// Store failures and mapper contract violations abort the transaction
    /// and are returned unchanged.
    pub async fn upsert(&self, incoming: M::Entity) -> StorageResult<()> {
        let mapper = Arc::clone(&self.mapper);
        let key = mapper.get_key(&incoming);
        tracing::debug!(kind = %M::KIND, table = mapper.table(), key = ?key, "upserting entity");

        let result = self
            .store
            .read_write(move |txn| upsert_in_txn(mapper.as_ref(), txn, key, incoming))
            .await;

        if let Err(e) = &result {
            tracing::warn!(kind = %M::KIND, error = %e, "upsert failed");
        }
        result
    }
}

impl<M, S> Clone for EntityWriter<M, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

fn upsert_in_txn<M: EntityMapper>(
    mapper: &M,
    txn: &mut dyn ReadWriteTransaction,
    key: M::Key,
    incoming: M::Entity,
) -> StorageResult<()> {
    let table = mapper.table();
    let existing = read_existing(mapper, txn, &key)?;
    let merged = mapper.merge(incoming, existing);

    let merged_key = mapper.get_key(&merged);
    if merged_key != key {
        return Err(StorageError::ContractViolation {
            table: table.to_string(),
            reason: format!("merge changed the natural key from {key:?} to {merged_key:?}"),
        });
    }

    let key_row: Row = to_row(&merged_key)?;
    let row: Row = to_row(&merged)?;
    txn.buffer_write(Mutation::insert_or_update(table, key_row, row));
    Ok(())
}

/// Fetch the row for `key`; zero rows is the absent case.
fn read_existing<M: EntityMapper>(
    mapper: &M,
    txn: &mut dyn ReadWriteTransaction,
    key: &M::Key,
) -> StorageResult<Option<M::Entity>> {
    let statement = mapper.select_one(key);
    let mut rows = txn.query(&statement)?;
    match rows.len() {
        0 => Ok(None),
        1 => {
            let row = rows.remove(0);
            Ok(Some(serde_json::from_value(serde_json::Value::Object(row))?))
        }
        n => Err(StorageError::ContractViolation {
            table: mapper.table().to_string(),
            reason: format!("point lookup for {key:?} returned {n} rows"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryStore;
    use crate::statement::Statement;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use webstatus_core::EntityKind;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Count")]
        count: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct CounterKey {
        #[serde(rename = "Name")]
        name: String,
    }

    /// Adds the incoming count to the stored one.
    #[derive(Default)]
    struct SummingMapper;

    impl EntityMapper for SummingMapper {
        type Key = CounterKey;
        type Entity = Counter;
        const KIND: EntityKind = EntityKind::ChromiumDailyUsageStat;

        fn table(&self) -> &'static str {
            "Counters"
        }

        fn select_one(&self, key: &CounterKey) -> Statement {
            Statement::select(self.table())
                .where_eq("Name", key.name.clone())
                .limit(1)
        }

        fn merge(&self, incoming: Counter, existing: Option<Counter>) -> Counter {
            match existing {
                Some(existing) => Counter {
                    count: existing.count + incoming.count,
                    ..existing
                },
                None => incoming,
            }
        }

        fn get_key(&self, entity: &Counter) -> CounterKey {
            CounterKey {
                name: entity.name.clone(),
            }
        }
    }

    /// Broken on purpose: renames the entity during merge.
    #[derive(Default)]
    struct RenamingMapper;

    impl EntityMapper for RenamingMapper {
        type Key = CounterKey;
        type Entity = Counter;
        const KIND: EntityKind = EntityKind::ChromiumDailyUsageStat;

        fn table(&self) -> &'static str {
            "Counters"
        }

        fn select_one(&self, key: &CounterKey) -> Statement {
            SummingMapper.select_one(key)
        }

        fn merge(&self, incoming: Counter, _existing: Option<Counter>) -> Counter {
            Counter {
                name: format!("{}-renamed", incoming.name),
                ..incoming
            }
        }

        fn get_key(&self, entity: &Counter) -> CounterKey {
            SummingMapper.get_key(entity)
        }
    }

    /// Broken on purpose: its lookup ignores the key and has no limit.
    #[derive(Default)]
    struct UnboundedMapper;

    impl EntityMapper for UnboundedMapper {
        type Key = CounterKey;
        type Entity = Counter;
        const KIND: EntityKind = EntityKind::ChromiumDailyUsageStat;

        fn table(&self) -> &'static str {
            "Counters"
        }

        fn select_one(&self, _key: &CounterKey) -> Statement {
            Statement::select(self.table())
        }

        fn merge(&self, incoming: Counter, _existing: Option<Counter>) -> Counter {
            incoming
        }

        fn get_key(&self, entity: &Counter) -> CounterKey {
            SummingMapper.get_key(entity)
        }
    }

    fn counter(name: &str, count: u32) -> Counter {
        Counter {
            name: name.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_when_absent() {
        let store = Arc::new(InMemoryStore::new());
        let writer = EntityWriter::<SummingMapper, _>::new(Arc::clone(&store));

        writer.upsert(counter("a", 3)).await.unwrap();

        let rows = store.rows("Counters").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Count"], 3);
    }

    #[tokio::test]
    async fn test_upsert_merges_with_existing() {
        let store = Arc::new(InMemoryStore::new());
        let writer = EntityWriter::<SummingMapper, _>::new(Arc::clone(&store));

        writer.upsert(counter("a", 3)).await.unwrap();
        writer.upsert(counter("a", 4)).await.unwrap();
        writer.upsert(counter("b", 1)).await.unwrap();

        let rows = store.rows("Counters").await;
        assert_eq!(rows.len(), 2);
        let a = rows.iter().find(|r| r["Name"] == "a").unwrap();
        assert_eq!(a["Count"], 7);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_serialize() {
        let store = Arc::new(InMemoryStore::new());
        let writer = EntityWriter::<SummingMapper, _>::new(Arc::clone(&store));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let writer = writer.clone();
            handles.push(tokio::spawn(async move {
                writer.upsert(counter("shared", 1)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store.rows("Counters").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Count"], 50);
    }

    #[tokio::test]
    async fn test_key_changing_merge_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let writer = EntityWriter::<RenamingMapper, _>::new(Arc::clone(&store));

        let err = writer.upsert(counter("a", 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::ContractViolation { .. }));
        assert_eq!(store.row_count("Counters").await, 0);
    }

    #[tokio::test]
    async fn test_multiple_rows_for_one_key_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        for name in ["a", "b"] {
            store
                .insert_raw(
                    "Counters",
                    json!({ "Name": name }).as_object().cloned().unwrap(),
                    json!({ "Name": name, "Count": 1 }).as_object().cloned().unwrap(),
                )
                .await
                .unwrap();
        }

        let writer = EntityWriter::<UnboundedMapper, _>::new(Arc::clone(&store));
        let err = writer.upsert(counter("a", 9)).await.unwrap_err();
        match err {
            StorageError::ContractViolation { reason, .. } => assert!(reason.contains("2 rows")),
            other => panic!("unexpected error: {:?}", other),
        }

        let rows = store.rows("Counters").await;
        assert!(rows.iter().all(|r| r["Count"] == 1));
    }

    #[tokio::test]
    async fn test_malformed_existing_row_fails_without_writing() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_raw(
                "Counters",
                json!({ "Name": "a" }).as_object().cloned().unwrap(),
                json!({ "Name": "a", "Count": "lots" }).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        let writer = EntityWriter::<SummingMapper, _>::new(Arc::clone(&store));
        let err = writer.upsert(counter("a", 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization { .. }));
        assert_eq!(store.rows("Counters").await[0]["Count"], "lots");
    }
}
