//! Entity mapper contract.
//!
//! A mapper describes one entity kind to the generic [`EntityWriter`]: where
//! its rows live, how to fetch one row by natural key, how an incoming value
//! merges with the stored one, and how to read the natural key back out of a
//! value. Mappers hold no state and never touch the store themselves.
//!
//! [`EntityWriter`]: crate::EntityWriter

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use webstatus_core::EntityKind;

use crate::statement::Statement;

/// Mapping between one entity kind and its stored rows.
///
/// # Implementation Requirements
///
/// - `select_one` must constrain the statement with `limit(1)`.
/// - `merge` must be pure and total: no I/O, and a valid value for every
///   `(incoming, existing)` pair including `existing == None`.
/// - `get_key(&merge(incoming, existing))` must equal `get_key(&incoming)`.
pub trait EntityMapper: Default + Send + Sync + 'static {
    /// Natural key type. Serializes to the primary-key columns of the table.
    type Key: Serialize + PartialEq + Debug + Send + Sync + 'static;

    /// Stored row type.
    type Entity: Serialize + DeserializeOwned + Send + 'static;

    /// Entity kind, used in errors and log fields.
    const KIND: EntityKind;

    /// Table holding this kind's rows.
    fn table(&self) -> &'static str;

    /// Point lookup of the row with natural key `key`.
    fn select_one(&self, key: &Self::Key) -> Statement;

    /// Value to persist given the caller's value and the stored one, if any.
    fn merge(&self, incoming: Self::Entity, existing: Option<Self::Entity>) -> Self::Entity;

    /// Natural key of a value.
    fn get_key(&self, entity: &Self::Entity) -> Self::Key;
}
