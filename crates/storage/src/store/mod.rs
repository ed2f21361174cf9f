#![forbid(unsafe_code)]

mod changes;
mod error;
mod history;
mod requests;
mod rows;
mod support;
mod transactions;

pub use error::{PrimaryError, StoreError};
pub use requests::*;
pub use rows::*;

pub(crate) use support::now_ns;

use crate::config::{DbLocation, UndoLogConfig};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

/// Append-only change log backing undo/redo for one logical session.
///
/// The session's `connections` row is created lazily, the first time an
/// operation needs its id, and the id is cached for the life of the log.
#[derive(Debug)]
pub struct UndoLog {
    conn: Connection,
    tree_id: Option<i64>,
    user_id: Option<String>,
    connection_id: Option<i64>,
    max_undo_depth: usize,
}

impl UndoLog {
    pub fn open(config: &UndoLogConfig) -> Result<Self, StoreError> {
        let conn = match &config.location {
            DbLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            DbLocation::Memory => Connection::open_in_memory()?,
        };
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let mut log = Self {
            conn,
            tree_id: config.tree_id,
            user_id: config.user_id.clone(),
            connection_id: None,
            max_undo_depth: config.max_undo_depth,
        };
        log.ensure_schema()?;

        if let Some(connection_id) = config.resume_connection {
            log.resume_connection(connection_id)?;
        }
        Ok(log)
    }

    /// Idempotently creates the history tables.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        support::install_schema(&self.conn)
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, err)| StoreError::Sql(err))
    }

    pub fn tree_id(&self) -> Option<i64> {
        self.tree_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn max_undo_depth(&self) -> usize {
        self.max_undo_depth
    }

    /// Id of this session's connection row, created on first use.
    pub fn connection_id(&mut self) -> Result<i64, StoreError> {
        if let Some(id) = self.connection_id {
            return Ok(id);
        }
        let id = self.make_connection_id()?;
        self.connection_id = Some(id);
        Ok(id)
    }

    pub fn connection(&mut self) -> Result<ConnectionRow, StoreError> {
        let id = self.connection_id()?;
        self.conn
            .query_row(
                "SELECT id, tree_id, user_id, timestamp FROM connections WHERE id=?1",
                params![id],
                connection_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownConnection(id))
    }

    fn make_connection_id(&mut self) -> Result<i64, StoreError> {
        let now = support::now_ns();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO connections(tree_id, user_id, timestamp) VALUES (?1, ?2, ?3)",
            params![self.tree_id, self.user_id, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(connection_id = id, tree_id = ?self.tree_id, "created history connection");
        Ok(id)
    }

    fn resume_connection(&mut self, connection_id: i64) -> Result<(), StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, tree_id, user_id, timestamp FROM connections WHERE id=?1",
                params![connection_id],
                connection_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownConnection(connection_id))?;
        if row.tree_id != self.tree_id {
            return Err(StoreError::InvalidInput(
                "resumed connection belongs to another tree",
            ));
        }
        debug!(connection_id, "resumed history connection");
        self.connection_id = Some(row.id);
        Ok(())
    }
}

fn connection_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: row.get(0)?,
        tree_id: row.get(1)?,
        user_id: row.get(2)?,
        timestamp_ns: row.get(3)?,
    })
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}

fn index_to_seq(index: usize) -> Result<i64, StoreError> {
    to_sqlite_i64(index)?
        .checked_add(1)
        .ok_or(StoreError::InvalidInput("numeric overflow"))
}

pub(crate) fn seq_to_index(seq: i64) -> Result<usize, StoreError> {
    seq.checked_sub(1)
        .and_then(|value| usize::try_from(value).ok())
        .ok_or(StoreError::InvalidInput("invalid change sequence id"))
}
