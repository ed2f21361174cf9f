#![forbid(unsafe_code)]

mod restore;
mod revert;
mod signals;
mod stack;

pub use revert::{ConflictKind, UndoCheck, UndoConflict, UndoTransactionReport};
pub use signals::{ReplayDirection, Signal, SignalKind};

use crate::config::UndoLogConfig;
use crate::primary::{HistoryLabels, PrimaryDatabase};
use crate::store::{
    ChangeRecord, NewChange, RecordTransactionRequest, StoreError, TransactionKind,
    TransactionRow, UndoLog, now_ns, seq_to_index,
};
use signals::SignalBatch;
use stack::HistoryStack;
use tl_core::ids::ChangeHandle;
use tl_core::{ObjectClass, Payload};
use tracing::{debug, info, warn};

/// A committed transaction as held on the undo and redo stacks: the
/// description plus the range of change indices it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionHandle {
    /// Id of the row written at commit time.
    pub transaction_id: i64,
    pub description: String,
    /// 0-based change indices; `None` for a transaction without changes.
    pub first: Option<usize>,
    pub last: Option<usize>,
    pub timestamp_ns: i64,
}

impl TransactionHandle {
    /// Change indices covered, in commit order.
    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        match (self.first, self.last) {
            (Some(first), Some(last)) => first..=last,
            // Empty range.
            _ => 1..=0,
        }
    }

    pub fn undo_label(&self) -> String {
        TransactionKind::Undo.label(&self.description)
    }

    pub fn redo_label(&self) -> String {
        TransactionKind::Redo.label(&self.description)
    }

    pub(crate) fn from_row(row: &TransactionRow) -> Result<Self, StoreError> {
        Ok(Self {
            transaction_id: row.id,
            description: row.description.clone(),
            first: row.first.map(seq_to_index).transpose()?,
            last: row.last.map(seq_to_index).transpose()?,
            timestamp_ns: row.timestamp_ns,
        })
    }

    pub(crate) fn same_range(&self, row: &TransactionRow) -> bool {
        let first = self.first.and_then(|i| i64::try_from(i + 1).ok());
        let last = self.last.and_then(|i| i64::try_from(i + 1).ok());
        first == row.first && last == row.last
    }
}

/// A transaction being built; changes are appended to the log as they are
/// recorded and grouped on [`UndoEngine::commit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    description: String,
    timestamp_ns: i64,
    first: Option<usize>,
    last: Option<usize>,
}

impl PendingTransaction {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    pub fn len(&self) -> usize {
        match (self.first, self.last) {
            (Some(first), Some(last)) => last - first + 1,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a successful undo or redo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayReport {
    pub direction: ReplayDirection,
    /// The handle that moved between the stacks.
    pub transaction: TransactionHandle,
    /// The `_Undo` / `_Redo` row appended to the history.
    pub recorded: TransactionRow,
    pub signals: Vec<Signal>,
}

/// Undo/redo driver over an [`UndoLog`] and the primary database it
/// replays into.
#[derive(Debug)]
pub struct UndoEngine<D: PrimaryDatabase> {
    log: UndoLog,
    db: D,
    undo_stack: HistoryStack,
    redo_stack: HistoryStack,
}

impl<D: PrimaryDatabase> UndoEngine<D> {
    /// Engine with empty stacks.
    pub fn new(log: UndoLog, db: D) -> Self {
        let bound = log.max_undo_depth();
        Self {
            log,
            db,
            undo_stack: HistoryStack::new(bound),
            redo_stack: HistoryStack::new(bound),
        }
    }

    /// Opens the log; when the config resumes an earlier connection the
    /// stacks are rebuilt from its stored transactions.
    pub fn open(config: &UndoLogConfig, db: D) -> Result<Self, StoreError> {
        let log = UndoLog::open(config)?;
        if config.resume_connection.is_some() {
            Self::restore(log, db)
        } else {
            Ok(Self::new(log, db))
        }
    }

    pub fn log(&self) -> &UndoLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut UndoLog {
        &mut self.log
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut D {
        &mut self.db
    }

    pub fn into_parts(self) -> (UndoLog, D) {
        (self.log, self.db)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.undo_stack.last().map(TransactionHandle::undo_label)
    }

    pub fn redo_label(&self) -> Option<String> {
        self.redo_stack.last().map(TransactionHandle::redo_label)
    }

    /// Transaction the next `undo` would revert.
    pub fn peek_undo(&self) -> Option<&TransactionHandle> {
        self.undo_stack.last()
    }

    pub fn peek_redo(&self) -> Option<&TransactionHandle> {
        self.redo_stack.last()
    }

    /// Undo stack, oldest first.
    pub fn undo_history(&self) -> impl DoubleEndedIterator<Item = &TransactionHandle> {
        self.undo_stack.iter()
    }

    pub fn begin(&self, description: impl Into<String>) -> PendingTransaction {
        PendingTransaction {
            description: description.into(),
            timestamp_ns: now_ns(),
            first: None,
            last: None,
        }
    }

    /// Appends `change` to the log and extends the pending range.
    pub fn record(
        &mut self,
        pending: &mut PendingTransaction,
        change: &NewChange,
    ) -> Result<usize, StoreError> {
        let index = self.log.append(change)?;
        pending.first.get_or_insert(index);
        pending.last = Some(index);
        Ok(index)
    }

    /// Applies the change's new state to the primary database, then records it.
    pub fn write(
        &mut self,
        pending: &mut PendingTransaction,
        change: &NewChange,
    ) -> Result<usize, StoreError> {
        apply_state(&mut self.db, change.obj_class, &change.handle, change.new.as_ref())?;
        self.record(pending, change)
    }

    pub fn commit(&mut self, pending: PendingTransaction) -> Result<TransactionHandle, StoreError> {
        let row = self.log.record_transaction(RecordTransactionRequest {
            description: pending.description,
            first: pending.first,
            last: pending.last,
            timestamp_ns: pending.timestamp_ns,
            kind: TransactionKind::Commit,
        })?;
        let handle = TransactionHandle::from_row(&row)?;
        self.push_undo(handle.clone());
        self.redo_stack.clear();
        self.notify_history();
        debug!(
            transaction_id = handle.transaction_id,
            description = %handle.description,
            "committed transaction"
        );
        Ok(handle)
    }

    /// Reverts the newest transaction on the undo stack. `Ok(None)` when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<ReplayReport>, StoreError> {
        let Some(handle) = self.undo_stack.last().cloned() else {
            return Ok(None);
        };
        let signals = self.replay(&handle, ReplayDirection::Undo)?;

        self.undo_stack.pop();
        self.redo_stack.push(handle.clone());
        let recorded = self.record_replay(&handle, TransactionKind::Undo)?;
        self.notify_history();
        info!(
            transaction_id = handle.transaction_id,
            description = %handle.description,
            "undid transaction"
        );
        Ok(Some(ReplayReport {
            direction: ReplayDirection::Undo,
            transaction: handle,
            recorded,
            signals,
        }))
    }

    /// Re-applies the newest transaction on the redo stack. `Ok(None)` when
    /// there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<ReplayReport>, StoreError> {
        let Some(handle) = self.redo_stack.last().cloned() else {
            return Ok(None);
        };
        let signals = self.replay(&handle, ReplayDirection::Redo)?;

        self.redo_stack.pop();
        self.push_undo(handle.clone());
        let recorded = self.record_replay(&handle, TransactionKind::Redo)?;
        self.notify_history();
        info!(
            transaction_id = handle.transaction_id,
            description = %handle.description,
            "redid transaction"
        );
        Ok(Some(ReplayReport {
            direction: ReplayDirection::Redo,
            transaction: handle,
            recorded,
            signals,
        }))
    }

    fn replay(
        &mut self,
        handle: &TransactionHandle,
        direction: ReplayDirection,
    ) -> Result<Vec<Signal>, StoreError> {
        let mut changes = handle
            .indices()
            .map(|index| self.log.get_by_index(index))
            .collect::<Result<Vec<_>, _>>()?;
        if direction == ReplayDirection::Undo {
            changes.reverse();
        }

        self.db.txn_begin().map_err(StoreError::Primary)?;
        match apply_replay(&mut self.db, &changes, direction) {
            Ok(signals) => Ok(signals),
            Err(err) => {
                if let Err(abort_err) = self.db.txn_abort() {
                    warn!(error = %abort_err, "primary database abort failed");
                }
                warn!(
                    transaction_id = handle.transaction_id,
                    ?direction,
                    error = %err,
                    "replay failed, primary database rolled back"
                );
                Err(err)
            }
        }
    }

    fn record_replay(
        &mut self,
        handle: &TransactionHandle,
        kind: TransactionKind,
    ) -> Result<TransactionRow, StoreError> {
        self.log.record_transaction(RecordTransactionRequest {
            description: handle.description.clone(),
            first: handle.first,
            last: handle.last,
            timestamp_ns: handle.timestamp_ns,
            kind,
        })
    }

    fn push_undo(&mut self, handle: TransactionHandle) {
        if let Some(evicted) = self.undo_stack.push(handle) {
            warn!(
                transaction_id = evicted.transaction_id,
                depth = self.log.max_undo_depth(),
                "undo depth reached, oldest transaction dropped"
            );
        }
    }

    fn notify_history(&mut self) {
        let labels = HistoryLabels {
            undo: self.undo_label(),
            redo: self.redo_label(),
        };
        self.db.on_history_change(&labels);
    }
}

/// Writes every change, emits the batched signals and commits the primary
/// transaction. Any error leaves the transaction open for the caller to abort.
fn apply_replay<D: PrimaryDatabase>(
    db: &mut D,
    changes: &[ChangeRecord],
    direction: ReplayDirection,
) -> Result<Vec<Signal>, StoreError> {
    let mut batch = SignalBatch::new(direction);
    for change in changes {
        let state = match direction {
            ReplayDirection::Undo => change.old.as_ref(),
            ReplayDirection::Redo => change.new.as_ref(),
        };
        apply_state(db, change.obj_class, &change.handle, state)?;
        if !change.obj_class.is_reference() {
            batch.note(change.obj_class, change.trans_type, change.handle.obj_handle());
        }
    }

    let signals = batch.signals();
    for signal in &signals {
        db.emit(&signal.name(), &signal.handles)
            .map_err(StoreError::Primary)?;
    }
    db.txn_commit().map_err(StoreError::Primary)?;
    Ok(signals)
}

fn apply_state<D: PrimaryDatabase>(
    db: &mut D,
    class: ObjectClass,
    handle: &ChangeHandle,
    state: Option<&Payload>,
) -> Result<(), StoreError> {
    if class.is_reference() {
        db.undo_reference(state, handle)
    } else {
        db.undo_data(state, handle.obj_handle(), class)
    }
    .map_err(StoreError::Primary)
}
