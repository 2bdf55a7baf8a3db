//! Remote store contract and its backends.
//!
//! The form depends only on [`RecordStore`]: create a row, update a row by id
//! with a partial document, and query a table. Column names are decided by
//! the caller's mapping layer.

mod memory;
mod schema;
mod sqlite;

pub use memory::*;
pub use schema::*;
pub use sqlite::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A row as returned by the store: server-assigned id and timestamps plus the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub table: String,
    pub fields: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of a column, if it holds one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// Equality conditions on document columns, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    conditions: Vec<(String, Value)>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.conditions
            .iter()
            .all(|(key, value)| fields.get(key) == Some(value))
    }
}

/// Generic row store consumed by the draft gateway.
pub trait RecordStore {
    /// Insert a new row and return it with its assigned id.
    fn create(&self, table: &str, record: Map<String, Value>) -> StoreResult<StoredRecord>;

    /// Merge `partial` into the row `id`; fails with `NotFound` if it does not exist.
    fn update(&self, table: &str, id: &str, partial: Map<String, Value>)
        -> StoreResult<StoredRecord>;

    /// Rows of `table` matching `filter`, newest first.
    fn query(&self, table: &str, filter: &RecordFilter) -> StoreResult<Vec<StoredRecord>>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn create(&self, table: &str, record: Map<String, Value>) -> StoreResult<StoredRecord> {
        (**self).create(table, record)
    }

    fn update(
        &self,
        table: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> StoreResult<StoredRecord> {
        (**self).update(table, id, partial)
    }

    fn query(&self, table: &str, filter: &RecordFilter) -> StoreResult<Vec<StoredRecord>> {
        (**self).query(table, filter)
    }
}

/// Keys the store owns; callers cannot write them.
pub(crate) const RESERVED_KEYS: &[&str] = &["id", "created_at", "updated_at"];

pub(crate) fn strip_reserved(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        fields.remove(*key);
    }
    fields
}
