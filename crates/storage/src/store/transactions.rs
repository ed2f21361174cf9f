#![forbid(unsafe_code)]

use super::{
    RecordTransactionRequest, StoreError, TransactionKind, TransactionRow, UndoLog, index_to_seq,
    support,
};
use rusqlite::params;
use tracing::debug;

pub(super) const SELECT_TRANSACTION_COLUMNS: &str =
    r#"t.id, t.connection_id, t.description, t."first", t."last", t.undo, t.timestamp"#;

impl UndoLog {
    /// Writes the transaction row that groups a contiguous range of changes.
    pub fn record_transaction(
        &mut self,
        request: RecordTransactionRequest,
    ) -> Result<TransactionRow, StoreError> {
        let (first, last) = match (request.first, request.last) {
            (Some(first), Some(last)) if first <= last => {
                (Some(index_to_seq(first)?), Some(index_to_seq(last)?))
            }
            (None, None) => (None, None),
            (Some(_), Some(_)) => {
                return Err(StoreError::InvalidInput(
                    "transaction range must satisfy first <= last",
                ));
            }
            _ => {
                return Err(StoreError::InvalidInput(
                    "transaction range needs both first and last",
                ));
            }
        };

        let description = request.kind.label(&request.description);
        let undo = matches!(request.kind, TransactionKind::Undo);
        let timestamp_ns = match request.kind {
            TransactionKind::Commit => request.timestamp_ns,
            TransactionKind::Undo | TransactionKind::Redo => support::now_ns(),
        };
        let connection_id = self.connection_id()?;

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO transactions(connection_id, description, "first", "last", undo, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                connection_id,
                description,
                first,
                last,
                i64::from(undo),
                timestamp_ns
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(
            transaction_id = id,
            connection_id,
            ?first,
            ?last,
            undo,
            "recorded transaction"
        );
        Ok(TransactionRow {
            id,
            connection_id,
            description,
            first,
            last,
            undo,
            timestamp_ns,
        })
    }

    /// All transactions of the current connection, oldest first.
    pub fn transactions_for_connection(&mut self) -> Result<Vec<TransactionRow>, StoreError> {
        let connection_id = self.connection_id()?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_TRANSACTION_COLUMNS} FROM transactions t WHERE t.connection_id=?1 ORDER BY t.id ASC"
        ))?;
        let rows = stmt.query_map(params![connection_id], transaction_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

pub(super) fn transaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok(TransactionRow {
        id: row.get(0)?,
        connection_id: row.get(1)?,
        description: row.get(2)?,
        first: row.get(3)?,
        last: row.get(4)?,
        undo: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
        timestamp_ns: row.get(6)?,
    })
}
