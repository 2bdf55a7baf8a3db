//! SQLite schema definition.

/// Schema for the local record store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Form Records (one JSON document per row, grouped by logical table)
-- ============================================================================

CREATE TABLE IF NOT EXISTS form_records (
    id TEXT PRIMARY KEY,
    table_name TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '{}',             -- JSON object of column values
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_form_records_table ON form_records(table_name, created_at);

-- Documents must be JSON objects
CREATE TRIGGER IF NOT EXISTS form_records_check_insert BEFORE INSERT ON form_records
BEGIN
    SELECT CASE
        WHEN json_type(new.data) IS NOT 'object' THEN
            RAISE(ABORT, 'Record data must be a JSON object')
    END;
END;

CREATE TRIGGER IF NOT EXISTS form_records_check_update BEFORE UPDATE OF data ON form_records
BEGIN
    SELECT CASE
        WHEN json_type(new.data) IS NOT 'object' THEN
            RAISE(ABORT, 'Record data must be a JSON object')
    END;
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_data_must_be_object() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO form_records (id, table_name, data) VALUES ('a', 't', '[1, 2]')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO form_records (id, table_name, data) VALUES ('a', 't', '{\"k\": 1}')",
            [],
        );
        assert!(result.is_ok());

        let result = conn.execute("UPDATE form_records SET data = 'nope' WHERE id = 'a'", []);
        assert!(result.is_err());
    }
}
