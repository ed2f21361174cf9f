#![forbid(unsafe_code)]

mod memory;

pub use memory::*;

use crate::PrimaryError;
use tl_core::ids::{ChangeHandle, Handle};
use tl_core::{ObjectClass, Payload};

/// Labels for the next available undo and redo step, e.g. `"_Undo Add person"`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryLabels {
    pub undo: Option<String>,
    pub redo: Option<String>,
}

/// The object store history is replayed into.
///
/// The engine wraps every replay in `txn_begin` / `txn_commit` and calls
/// `txn_abort` when anything inside the replay fails.
pub trait PrimaryDatabase {
    fn txn_begin(&mut self) -> Result<(), PrimaryError>;

    fn txn_commit(&mut self) -> Result<(), PrimaryError>;

    fn txn_abort(&mut self) -> Result<(), PrimaryError>;

    /// Current state of the object, `None` when it does not exist.
    fn get_data(&self, handle: &Handle, class: ObjectClass) -> Result<Option<Payload>, PrimaryError>;

    /// Writes `data` as the state of the object, or removes it when `None`.
    fn undo_data(
        &mut self,
        data: Option<&Payload>,
        handle: &Handle,
        class: ObjectClass,
    ) -> Result<(), PrimaryError>;

    /// Same as [`PrimaryDatabase::undo_data`] for a reference-table row.
    fn undo_reference(
        &mut self,
        data: Option<&Payload>,
        handle: &ChangeHandle,
    ) -> Result<(), PrimaryError>;

    /// Change notification, e.g. `("person-delete", [handles])`.
    fn emit(&mut self, signal: &str, handles: &[Handle]) -> Result<(), PrimaryError>;

    fn on_history_change(&mut self, _labels: &HistoryLabels) {}
}
