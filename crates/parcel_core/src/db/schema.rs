//! Parcel table layout.
//!
//! # Invariants
//! - `number` is `AUTOINCREMENT`, so identifiers are never reused after delete.
//! - `PARCEL_COLUMNS` lists every column the store reads, in decode order.

use super::DbResult;
use rusqlite::Connection;

/// Table holding every persisted parcel.
pub const PARCEL_TABLE: &str = "parcel";

/// Columns the store depends on, in the order rows are decoded.
pub const PARCEL_COLUMNS: &[&str] = &["number", "client", "status", "address", "created_at"];

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS parcel (
    number     INTEGER PRIMARY KEY AUTOINCREMENT,
    client     INTEGER NOT NULL,
    status     TEXT    NOT NULL,
    address    TEXT    NOT NULL,
    created_at TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_parcel_client ON parcel(client);
";

/// Creates the parcel table and its client index if missing.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Returns whether `table` exists in the main schema.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns the column names of `table` in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}
