#![forbid(unsafe_code)]

use super::super::changes::{
    RawChangeRow, SELECT_CHANGE_COLUMNS, decode_change, overwrite_change_tx, raw_change_row,
};
use super::super::{NewChange, StoreError, UndoLog};
use super::ProgressFn;
use rusqlite::params;
use tl_core::{Payload, PayloadFormat};
use tracing::{debug, info};

impl UndoLog {
    /// Rewrites every change of the tree whose payloads still use the legacy
    /// bare-JSON encoding into the current versioned envelope. Returns the
    /// number of rewritten changes.
    pub fn reserialize_payloads(
        &mut self,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<usize, StoreError> {
        let keys = self.change_keys_in_tree()?;
        let total = keys.len();
        let mut rewritten = 0usize;

        for (done, (connection_id, seq)) in keys.into_iter().enumerate() {
            let tx = self.conn.transaction()?;
            let raw = tx.query_row(
                &format!(
                    "SELECT {SELECT_CHANGE_COLUMNS} FROM changes WHERE connection_id=?1 AND id=?2"
                ),
                params![connection_id, seq],
                raw_change_row,
            )?;
            if has_legacy_payload(&raw)? {
                let record = decode_change(raw)?;
                let change = NewChange {
                    obj_class: record.obj_class,
                    trans_type: record.trans_type,
                    handle: record.handle,
                    old: record.old,
                    new: record.new,
                };
                overwrite_change_tx(&tx, connection_id, seq, &change)?;
                rewritten += 1;
                debug!(connection_id, seq, "re-serialized legacy payload");
            }
            tx.commit()?;

            if let Some(progress) = progress.as_mut() {
                progress(done + 1, total);
            }
        }

        info!(total, rewritten, "payload re-serialization finished");
        Ok(rewritten)
    }

    fn change_keys_in_tree(&self) -> Result<Vec<(i64, i64)>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT ch.connection_id, ch.id
            FROM changes ch JOIN connections c ON c.id = ch.connection_id
            WHERE c.tree_id IS ?1
            ORDER BY ch.connection_id ASC, ch.id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![self.tree_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn has_legacy_payload(raw: &RawChangeRow) -> Result<bool, StoreError> {
    for blob in [raw.6.as_deref(), raw.7.as_deref()].into_iter().flatten() {
        let (_, format) = Payload::decode_with_format(blob)?;
        if format == PayloadFormat::Legacy {
            return Ok(true);
        }
    }
    Ok(false)
}
