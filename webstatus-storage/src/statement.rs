//! Rows, statements and mutations understood by every [`Store`](crate::Store).
//!
//! A row is a JSON object keyed by column name. Statements are evaluated the
//! same way by every store so query semantics never depend on the backend.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Value};
use webstatus_core::{StorageError, StorageResult};

/// A stored row: column name to value.
pub type Row = Map<String, Value>;

/// Column predicate of a [`Statement`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(String, Value),
    Gte(String, Value),
    Lt(String, Value),
}

impl Predicate {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Eq(column, value) => row.get(column) == Some(value),
            Predicate::Gte(column, value) => row
                .get(column)
                .and_then(|v| compare_values(v, value))
                .is_some_and(|ord| ord != Ordering::Less),
            Predicate::Lt(column, value) => row
                .get(column)
                .and_then(|v| compare_values(v, value))
                .is_some_and(|ord| ord == Ordering::Less),
        }
    }
}

/// Sort direction for [`Statement::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Name and primary-key columns of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub key_columns: &'static [&'static str],
}

impl TableSchema {
    pub const fn new(name: &'static str, key_columns: &'static [&'static str]) -> Self {
        Self { name, key_columns }
    }
}

/// A select over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    table: String,
    predicates: Vec<Predicate>,
    order_by: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Statement {
    /// Start a select over `table` with no predicates.
    pub fn select(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq(column.into(), value.into()));
        self
    }

    pub fn where_gte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Gte(column.into(), value.into()));
        self
    }

    pub fn where_lt(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Lt(column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Primary key pinned by the equality predicates, if they cover every
    /// column in `key_columns`.
    ///
    /// Other predicates still apply to the row found under that key.
    pub fn key_projection(&self, key_columns: &[&str]) -> Option<Row> {
        if key_columns.is_empty() {
            return None;
        }
        let mut key = Row::new();
        for column in key_columns {
            let value = self.predicates.iter().find_map(|p| match p {
                Predicate::Eq(c, v) if c == column => Some(v.clone()),
                _ => None,
            })?;
            key.insert((*column).to_string(), value);
        }
        Some(key)
    }

    /// Returns true if `row` satisfies every predicate.
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Filter, order and limit `rows`.
    ///
    /// Input order is preserved among rows that compare equal on the
    /// ordering column.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut out: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect();

        if let Some((column, direction)) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = match (a.get(column), b.get(column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

/// Compare two scalar values of the same JSON type.
///
/// Strings compare lexically, which orders ISO dates and timestamps
/// chronologically. Mixed or non-scalar types do not compare.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// A buffered write applied when a read-write transaction commits.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert the row, or replace the row with the same primary key.
    InsertOrUpdate { table: String, key: Row, row: Row },
}

impl Mutation {
    pub fn insert_or_update(table: impl Into<String>, key: Row, row: Row) -> Self {
        Mutation::InsertOrUpdate {
            table: table.into(),
            key,
            row,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Mutation::InsertOrUpdate { table, .. } => table,
        }
    }
}

/// Serialize a value that must be a JSON object into a [`Row`].
pub fn to_row<T: Serialize + ?Sized>(value: &T) -> StorageResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Serialization {
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Canonical byte encoding of a primary key.
///
/// [`Row`] keeps its columns sorted, so equal keys always encode to equal
/// bytes regardless of the order the columns were inserted.
pub fn encode_key(key: &Row) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_eq_predicates() {
        let stmt = Statement::select("T")
            .where_eq("A", "x")
            .where_eq("B", 2);
        assert!(stmt.matches(&row(json!({"A": "x", "B": 2, "C": true}))));
        assert!(!stmt.matches(&row(json!({"A": "x", "B": 3}))));
        assert!(!stmt.matches(&row(json!({"A": "x"}))));
    }

    #[test]
    fn test_range_predicates_on_dates() {
        let stmt = Statement::select("T")
            .where_gte("Date", "2000-01-01")
            .where_lt("Date", "2000-01-10");
        assert!(stmt.matches(&row(json!({"Date": "2000-01-01"}))));
        assert!(stmt.matches(&row(json!({"Date": "2000-01-09"}))));
        assert!(!stmt.matches(&row(json!({"Date": "2000-01-10"}))));
        assert!(!stmt.matches(&row(json!({"Date": "1999-12-31"}))));
    }

    #[test]
    fn test_mixed_types_do_not_match_ranges() {
        let stmt = Statement::select("T").where_gte("N", 5);
        assert!(!stmt.matches(&row(json!({"N": "7"}))));
        assert!(stmt.matches(&row(json!({"N": 7.5}))));
    }

    #[test]
    fn test_apply_orders_and_limits() {
        let rows = vec![
            row(json!({"D": "2000-01-02"})),
            row(json!({"D": "2000-01-03"})),
            row(json!({"D": "2000-01-01"})),
        ];
        let stmt = Statement::select("T")
            .order_by("D", Direction::Desc)
            .limit(2);
        let out = stmt.apply(rows.iter());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["D"], "2000-01-03");
        assert_eq!(out[1]["D"], "2000-01-02");
    }

    #[test]
    fn test_encode_key_ignores_insertion_order() {
        let mut a = Row::new();
        a.insert("WebFeatureID".into(), json!("f1"));
        a.insert("BrowserName".into(), json!("chrome"));
        let mut b = Row::new();
        b.insert("BrowserName".into(), json!("chrome"));
        b.insert("WebFeatureID".into(), json!("f1"));
        assert_eq!(encode_key(&a).unwrap(), encode_key(&b).unwrap());
    }

    #[test]
    fn test_key_projection_needs_every_key_column() {
        let stmt = Statement::select("T")
            .where_eq("WebFeatureID", "f1")
            .where_eq("BrowserName", "chrome")
            .where_eq("BrowserVersion", "120");
        let key = stmt
            .key_projection(&["WebFeatureID", "BrowserName"])
            .unwrap();
        assert_eq!(key, row(json!({"WebFeatureID": "f1", "BrowserName": "chrome"})));

        assert!(stmt.key_projection(&["WebFeatureID", "Date"]).is_none());
        assert!(stmt.key_projection(&[]).is_none());
        let ranged = Statement::select("T")
            .where_eq("WebFeatureID", "f1")
            .where_gte("Date", "2000-01-01");
        assert!(ranged.key_projection(&["WebFeatureID", "Date"]).is_none());
    }

    #[test]
    fn test_to_row_rejects_scalars() {
        assert!(matches!(
            to_row(&42),
            Err(StorageError::Serialization { .. })
        ));
    }
}
