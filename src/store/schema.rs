//! SQL DDL for an embedding store database.
//!
//! Each store directory holds one SQLite file with a `documents` table and a
//! `documents_vec` vec0 virtual table. All DDL uses `IF NOT EXISTS` for
//! idempotent initialization.

use rusqlite::Connection;

/// DDL for the documents table and its indexes.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL,
    seed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_seed ON documents(seed);

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all tables. The vec0 table dimension is fixed at creation and
/// must match the configured embedding encoder.
pub fn init_schema(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // vec0 virtual table must be created separately (sqlite-vec syntax), and
    // the dimension is part of the DDL.
    let vec_sql = format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS documents_vec USING vec0(
            id TEXT PRIMARY KEY,
            embedding FLOAT[{dimensions}]
        );"
    );
    conn.execute_batch(&vec_sql)?;

    conn.execute(
        "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('dimensions', ?1)",
        [dimensions.to_string()],
    )?;

    Ok(())
}

/// Read the dimension recorded when the store was created.
pub fn stored_dimensions(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    use rusqlite::OptionalExtension;
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = 'dimensions'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()))
}
