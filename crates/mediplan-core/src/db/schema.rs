//! SQLite schema definition.

/// Schema for the SQLite key-value backend.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Key-value entries (one JSON document per collection)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
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
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_key_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?, ?)",
            ["mediplan_patients", "[]"],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?, ?)",
            ["mediplan_patients", "[]"],
        );
        assert!(result.is_err());
    }
}
