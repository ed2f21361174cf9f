#![forbid(unsafe_code)]

use super::signals::{ReplayDirection, Signal, SignalBatch};
use super::{TransactionHandle, UndoEngine, apply_state};
use crate::primary::PrimaryDatabase;
use crate::store::{ChangeRecord, NewChange, StoreError, TransactionKind};
use serde::Serialize;
use tl_core::TransType;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Undoing a delete, but an object with that handle exists again.
    ObjectExists,
    /// The object no longer holds the state the transaction left behind.
    ObjectChanged,
    /// The primary database could not report the object's state.
    CheckFailed,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ObjectExists => "object_exists",
            Self::ObjectChanged => "object_changed",
            Self::CheckFailed => "check_failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UndoConflict {
    /// Position of the change within the transaction, in commit order.
    pub change_index: usize,
    pub obj_class: String,
    pub handle: String,
    pub kind: ConflictKind,
    pub description: String,
}

/// Whether a stored transaction can be reverted without overwriting later
/// edits. Reference-table changes are never checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UndoCheck {
    pub transaction_id: i64,
    pub can_undo_without_force: bool,
    /// Object changes considered, reference changes excluded.
    pub total_changes: usize,
    pub conflicts: Vec<UndoConflict>,
}

impl UndoCheck {
    fn conflict_at(&self, change_index: usize) -> bool {
        self.conflicts
            .iter()
            .any(|conflict| conflict.change_index == change_index)
    }
}

/// Outcome of [`UndoEngine::undo_transaction`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoTransactionReport {
    pub check: UndoCheck,
    /// The new forward transaction; `None` when nothing was applied.
    pub transaction: Option<TransactionHandle>,
    pub applied: usize,
    /// Conflicting changes left untouched because `force` was off.
    pub skipped: usize,
    pub signals: Vec<Signal>,
}

impl<D: PrimaryDatabase> UndoEngine<D> {
    /// Compares every object change of a stored transaction against the
    /// primary database's current state.
    pub fn check_undo(&self, transaction_id: i64) -> Result<UndoCheck, StoreError> {
        let (_, changes) = self.log.transaction_changes(transaction_id)?;
        Ok(self.check_changes(transaction_id, &changes))
    }

    /// Reverts any transaction of the tree, not only the top of the undo
    /// stack. The reversed changes are applied in one primary transaction
    /// and committed as a new forward transaction labelled `_Undo <desc>`,
    /// which clears the redo stack. Conflicting changes are skipped unless
    /// `force` is set.
    pub fn undo_transaction(
        &mut self,
        transaction_id: i64,
        force: bool,
    ) -> Result<UndoTransactionReport, StoreError> {
        let (row, changes) = self.log.transaction_changes(transaction_id)?;
        let check = self.check_changes(transaction_id, &changes);

        let mut reversed = Vec::new();
        let mut skipped = 0usize;
        for (change_index, change) in changes.iter().enumerate().rev() {
            if !force && check.conflict_at(change_index) {
                skipped += 1;
                continue;
            }
            let change = reverse_change(change);
            change.validate().map_err(StoreError::InvalidInput)?;
            reversed.push(change);
        }

        if reversed.is_empty() {
            info!(transaction_id, skipped, "nothing to undo in transaction");
            return Ok(UndoTransactionReport {
                check,
                transaction: None,
                applied: 0,
                skipped,
                signals: Vec::new(),
            });
        }

        self.db.txn_begin().map_err(StoreError::Primary)?;
        let signals = match apply_forward(&mut self.db, &reversed) {
            Ok(signals) => signals,
            Err(err) => {
                if let Err(abort_err) = self.db.txn_abort() {
                    warn!(error = %abort_err, "primary database abort failed");
                }
                warn!(transaction_id, error = %err, "undo by id failed, primary database rolled back");
                return Err(err);
            }
        };

        let mut pending = self.begin(TransactionKind::Undo.label(&row.description));
        for change in &reversed {
            self.record(&mut pending, change)?;
        }
        let handle = self.commit(pending)?;
        info!(
            transaction_id,
            new_transaction_id = handle.transaction_id,
            applied = reversed.len(),
            skipped,
            force,
            "undid transaction by id"
        );
        Ok(UndoTransactionReport {
            check,
            transaction: Some(handle),
            applied: reversed.len(),
            skipped,
            signals,
        })
    }

    fn check_changes(&self, transaction_id: i64, changes: &[ChangeRecord]) -> UndoCheck {
        let mut conflicts = Vec::new();
        let mut total_changes = 0usize;
        for (change_index, change) in changes.iter().enumerate() {
            if change.obj_class.is_reference() {
                continue;
            }
            total_changes += 1;
            let handle = change.handle.obj_handle();
            let conflict = |kind, description| UndoConflict {
                change_index,
                obj_class: change.obj_class.name().to_string(),
                handle: handle.to_string(),
                kind,
                description,
            };

            let current = match self.db.get_data(handle, change.obj_class) {
                Ok(current) => current,
                Err(err) => {
                    conflicts.push(conflict(
                        ConflictKind::CheckFailed,
                        format!("could not read current state: {err}"),
                    ));
                    continue;
                }
            };
            match change.trans_type {
                TransType::Delete if current.is_some() => conflicts.push(conflict(
                    ConflictKind::ObjectExists,
                    format!("cannot undo delete: object {handle} exists again"),
                )),
                TransType::Delete => {}
                TransType::Add | TransType::Update if current != change.new => {
                    conflicts.push(conflict(
                        ConflictKind::ObjectChanged,
                        format!(
                            "{} {handle} was modified after the transaction",
                            change.obj_class.name()
                        ),
                    ))
                }
                TransType::Add | TransType::Update => {}
            }
        }
        UndoCheck {
            transaction_id,
            can_undo_without_force: conflicts.is_empty(),
            total_changes,
            conflicts,
        }
    }
}

/// The change that takes the object from the stored new state back to the old.
fn reverse_change(change: &ChangeRecord) -> NewChange {
    let trans_type = match change.trans_type {
        TransType::Add => TransType::Delete,
        TransType::Delete => TransType::Add,
        TransType::Update => TransType::Update,
    };
    NewChange {
        obj_class: change.obj_class,
        trans_type,
        handle: change.handle.clone(),
        old: change.new.clone(),
        new: change.old.clone(),
    }
}

/// Like a redo: writes each change's new state, emits and commits. Any error
/// leaves the primary transaction open for the caller to abort.
fn apply_forward<D: PrimaryDatabase>(
    db: &mut D,
    changes: &[NewChange],
) -> Result<Vec<Signal>, StoreError> {
    let mut batch = SignalBatch::new(ReplayDirection::Redo);
    for change in changes {
        apply_state(db, change.obj_class, &change.handle, change.new.as_ref())?;
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
