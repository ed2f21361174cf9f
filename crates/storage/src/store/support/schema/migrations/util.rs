#![forbid(unsafe_code)]

use super::super::super::super::StoreError;
use rusqlite::Connection;
use tracing::debug;

pub(super) fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Adds `column` unless the table already has it. Returns whether it was added.
pub(super) fn ensure_column(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> Result<bool, StoreError> {
    if table_columns(conn, table)?.iter().any(|name| name == column) {
        return Ok(false);
    }
    match conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"), []) {
        Ok(_) => {
            debug!(table, column, "added history column");
            Ok(true)
        }
        // Another writer added it between the check and the ALTER.
        Err(rusqlite::Error::SqliteFailure(_, Some(message)))
            if message.contains("duplicate column name") =>
        {
            Ok(false)
        }
        Err(err) => Err(StoreError::Sql(err)),
    }
}
