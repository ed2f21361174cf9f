#![forbid(unsafe_code)]

use super::super::changes::{SELECT_CHANGE_COLUMNS, decode_change, raw_change_row};
use super::super::rows::seconds_to_ns;
use super::super::transactions::{SELECT_TRANSACTION_COLUMNS, transaction_row};
use super::super::{
    ChangeRecord, StoreError, TransactionRow, TransactionView, TransactionsRequest, UndoLog,
    to_sqlite_i64,
};
use super::{ConnectionFields, VISIBLE_IN_TREE, build_view};
use rusqlite::{OptionalExtension, params};

impl UndoLog {
    /// Paginated history of the log's tree. Returns the page and the total
    /// number of transactions matching the filters.
    pub fn get_transactions(
        &self,
        request: &TransactionsRequest,
    ) -> Result<(Vec<TransactionView>, usize), StoreError> {
        let before = time_filter(request.before);
        let after = time_filter(request.after);

        let total: i64 = self.conn.query_row(
            &format!(
                r#"
                SELECT COUNT(*)
                FROM transactions t JOIN connections c ON c.id = t.connection_id
                WHERE {VISIBLE_IN_TREE}
                  AND (?2 IS NULL OR t.timestamp < ?2)
                  AND (?3 IS NULL OR t.timestamp >= ?3)
                "#
            ),
            params![self.tree_id, before, after],
            |row| row.get(0),
        )?;

        let (limit, offset) = if request.page > 0 && request.pagesize > 0 {
            let limit = to_sqlite_i64(request.pagesize)?;
            let offset = to_sqlite_i64(request.page - 1)?
                .checked_mul(limit)
                .ok_or(StoreError::InvalidInput("numeric overflow"))?;
            (limit, offset)
        } else {
            (-1, 0)
        };
        let order = if request.ascending { "ASC" } else { "DESC" };

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {SELECT_TRANSACTION_COLUMNS}, c.user_id, c.timestamp
            FROM transactions t JOIN connections c ON c.id = t.connection_id
            WHERE {VISIBLE_IN_TREE}
              AND (?2 IS NULL OR t.timestamp < ?2)
              AND (?3 IS NULL OR t.timestamp >= ?3)
            ORDER BY t.id {order}
            LIMIT ?4 OFFSET ?5
            "#
        ))?;
        let rows = stmt.query_map(
            params![self.tree_id, before, after, limit, offset],
            |row| {
                Ok((
                    transaction_row(row)?,
                    ConnectionFields {
                        user_id: row.get(7)?,
                        timestamp_ns: row.get(8)?,
                    },
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (transaction, connection) = row?;
            out.push(build_view(
                &self.conn,
                transaction,
                connection,
                request.old_data,
                request.new_data,
            )?);
        }
        Ok((out, usize::try_from(total).unwrap_or_default()))
    }

    /// Full detail of one transaction of the log's tree.
    pub fn get_transaction(
        &self,
        transaction_id: i64,
        old_data: bool,
        new_data: bool,
    ) -> Result<TransactionView, StoreError> {
        let found = self
            .conn
            .query_row(
                &format!(
                    r#"
                    SELECT {SELECT_TRANSACTION_COLUMNS}, c.user_id, c.timestamp
                    FROM transactions t JOIN connections c ON c.id = t.connection_id
                    WHERE {VISIBLE_IN_TREE}
                      AND t.id = ?2
                    "#
                ),
                params![self.tree_id, transaction_id],
                |row| {
                    Ok((
                        transaction_row(row)?,
                        ConnectionFields {
                            user_id: row.get(7)?,
                            timestamp_ns: row.get(8)?,
                        },
                    ))
                },
            )
            .optional()?;

        let Some((transaction, connection)) = found else {
            return Err(StoreError::UnknownTransaction(transaction_id));
        };
        build_view(&self.conn, transaction, connection, old_data, new_data)
    }

    /// A transaction of the log's tree with its changes decoded for replay,
    /// in commit order. The transaction may belong to any connection.
    pub fn transaction_changes(
        &self,
        transaction_id: i64,
    ) -> Result<(TransactionRow, Vec<ChangeRecord>), StoreError> {
        let transaction = self
            .conn
            .query_row(
                &format!(
                    r#"
                    SELECT {SELECT_TRANSACTION_COLUMNS}
                    FROM transactions t JOIN connections c ON c.id = t.connection_id
                    WHERE {VISIBLE_IN_TREE}
                      AND t.id = ?2
                    "#
                ),
                params![self.tree_id, transaction_id],
                transaction_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownTransaction(transaction_id))?;

        let (Some(first), Some(last)) = (transaction.first, transaction.last) else {
            return Ok((transaction, Vec::new()));
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_CHANGE_COLUMNS} FROM changes WHERE connection_id=?1 AND id>=?2 AND id<=?3 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(
            params![transaction.connection_id, first, last],
            raw_change_row,
        )?;
        let mut changes = Vec::new();
        for raw in rows {
            changes.push(decode_change(raw?)?);
        }
        Ok((transaction, changes))
    }
}

/// `None` and zero both mean "no bound".
fn time_filter(seconds: Option<f64>) -> Option<i64> {
    seconds.filter(|value| *value != 0.0).map(seconds_to_ns)
}
