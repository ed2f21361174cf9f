#![forbid(unsafe_code)]

mod migrations;
mod sql;

use super::super::StoreError;
use rusqlite::Connection;
use tracing::debug;

/// Creates the history tables. Safe to run against an existing database,
/// including one another process is initializing at the same time.
pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    debug!("installing undo history schema");
    match conn.execute_batch(&sql::full_schema_sql()) {
        Ok(()) => {}
        Err(err) if is_already_exists(&err) => {
            debug!("undo history schema already present: {err}");
        }
        Err(err) => return Err(StoreError::Sql(err)),
    }

    migrations::apply(conn)?;
    Ok(())
}

fn is_already_exists(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.contains("already exists"),
        _ => false,
    }
}
