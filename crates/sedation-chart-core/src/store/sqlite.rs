//! SQLite-backed record store.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::{strip_reserved, RecordFilter, RecordStore, StoreError, StoreResult, StoredRecord, SCHEMA};

/// Record store over a single SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open store at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Initialize schema.
    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get a row by id.
    pub fn get(&self, table: &str, id: &str) -> StoreResult<Option<StoredRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, table_name, data, created_at, updated_at
                FROM form_records
                WHERE table_name = ?1 AND id = ?2
                "#,
                params![table, id],
                read_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

impl RecordStore for SqliteStore {
    fn create(&self, table: &str, record: Map<String, Value>) -> StoreResult<StoredRecord> {
        let fields = strip_reserved(record);
        let now = timestamp();
        let stored = StoredRecord {
            id: uuid::Uuid::new_v4().to_string(),
            table: table.to_string(),
            fields,
            created_at: now.clone(),
            updated_at: now,
        };

        self.conn.execute(
            r#"
            INSERT INTO form_records (id, table_name, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                stored.id,
                stored.table,
                serde_json::to_string(&stored.fields)?,
                stored.created_at,
                stored.updated_at,
            ],
        )?;
        Ok(stored)
    }

    fn update(
        &self,
        table: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> StoreResult<StoredRecord> {
        let tx = self.conn.unchecked_transaction()?;

        let mut stored = self
            .get(table, id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        stored.fields.extend(strip_reserved(partial));
        stored.updated_at = timestamp();

        tx.execute(
            r#"
            UPDATE form_records SET
                data = ?3,
                updated_at = ?4
            WHERE table_name = ?1 AND id = ?2
            "#,
            params![
                table,
                id,
                serde_json::to_string(&stored.fields)?,
                stored.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(stored)
    }

    fn query(&self, table: &str, filter: &RecordFilter) -> StoreResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, table_name, data, created_at, updated_at
            FROM form_records
            WHERE table_name = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map([table], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            let record: StoredRecord = row?.try_into()?;
            if filter.matches(&record.fields) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// Fixed-width RFC 3339 so timestamps sort as text.
fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Intermediate row struct for database mapping.
struct RecordRow {
    id: String,
    table_name: String,
    data: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        table_name: row.get(1)?,
        data: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl TryFrom<RecordRow> for StoredRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let fields = match serde_json::from_str(&row.data)? {
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::Constraint(format!(
                    "Record {} holds non-object data: {}",
                    row.id, other
                )))
            }
        };
        Ok(StoredRecord {
            id: row.id,
            table: row.table_name,
            fields,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
