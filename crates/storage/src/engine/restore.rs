#![forbid(unsafe_code)]

use super::{TransactionHandle, UndoEngine};
use crate::primary::PrimaryDatabase;
use crate::store::{StoreError, TransactionKind, TransactionRow, UndoLog};
use tracing::{debug, warn};

impl<D: PrimaryDatabase> UndoEngine<D> {
    /// Rebuilds the stacks from the transactions already stored for the
    /// log's connection, replaying the commit/undo/redo sequence without
    /// touching the primary database.
    pub fn restore(log: UndoLog, db: D) -> Result<Self, StoreError> {
        let mut engine = Self::new(log, db);
        let rows = engine.log.transactions_for_connection()?;
        for row in &rows {
            engine.restore_row(row)?;
        }
        engine.notify_history();
        debug!(
            transactions = rows.len(),
            undo = engine.undo_count(),
            redo = engine.redo_count(),
            "restored undo history"
        );
        Ok(engine)
    }

    fn restore_row(&mut self, row: &TransactionRow) -> Result<(), StoreError> {
        if row.undo {
            let matches_top = self
                .undo_stack
                .last()
                .is_some_and(|top| is_replay_of(top, row, TransactionKind::Undo));
            if matches_top {
                if let Some(handle) = self.undo_stack.pop() {
                    self.redo_stack.push(handle);
                }
            } else {
                warn!(
                    transaction_id = row.id,
                    "undo row without matching transaction, ignored"
                );
            }
            return Ok(());
        }

        let is_redo = self
            .redo_stack
            .last()
            .is_some_and(|top| is_replay_of(top, row, TransactionKind::Redo));
        if is_redo {
            if let Some(handle) = self.redo_stack.pop() {
                self.push_undo(handle);
            }
            return Ok(());
        }

        self.push_undo(TransactionHandle::from_row(row)?);
        self.redo_stack.clear();
        Ok(())
    }
}

fn is_replay_of(handle: &TransactionHandle, row: &TransactionRow, kind: TransactionKind) -> bool {
    handle.same_range(row) && kind.label(&handle.description) == row.description
}
