#![forbid(unsafe_code)]

use super::super::{StoreError, UndoLog};
use super::{ProgressFn, VISIBLE_IN_TREE};
use rusqlite::params;
use std::io::Write;
use tracing::debug;

impl UndoLog {
    /// Writes every transaction of the tree, with payloads, as one JSON
    /// document per line. Transactions are loaded one at a time.
    pub fn export_history(
        &self,
        out: &mut dyn Write,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<usize, StoreError> {
        let ids = self.visible_transaction_ids()?;
        let total = ids.len();
        for (done, id) in ids.into_iter().enumerate() {
            let view = self.get_transaction(id, true, true)?;
            serde_json::to_writer(&mut *out, &view)?;
            out.write_all(b"\n")?;
            if let Some(progress) = progress.as_mut() {
                progress(done + 1, total);
            }
        }
        out.flush()?;
        debug!(total, "exported history");
        Ok(total)
    }

    fn visible_transaction_ids(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT t.id
            FROM transactions t JOIN connections c ON c.id = t.connection_id
            WHERE {VISIBLE_IN_TREE}
            ORDER BY t.id ASC
            "#
        ))?;
        let rows = stmt.query_map(params![self.tree_id], |row| row.get::<_, i64>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
