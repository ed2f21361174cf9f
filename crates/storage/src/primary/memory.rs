#![forbid(unsafe_code)]

use super::{HistoryLabels, PrimaryDatabase};
use crate::PrimaryError;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tl_core::ids::{ChangeHandle, Handle};
use tl_core::{ObjectClass, Payload};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmittedSignal {
    pub name: String,
    pub handles: Vec<Handle>,
}

type ObjectKey = (ObjectClass, Handle);
type ReferenceKey = (Handle, Option<Handle>);

#[derive(Clone, Debug, Default)]
struct Snapshot {
    objects: BTreeMap<ObjectKey, JsonValue>,
    references: BTreeMap<ReferenceKey, JsonValue>,
    emitted: usize,
}

/// In-process primary database keeping objects as JSON, with snapshot-based
/// transactions.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    objects: BTreeMap<ObjectKey, JsonValue>,
    references: BTreeMap<ReferenceKey, JsonValue>,
    emitted: Vec<EmittedSignal>,
    labels: HistoryLabels,
    open_txn: Option<Snapshot>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: ObjectClass, handle: &Handle) -> Option<&JsonValue> {
        self.objects.get(&(class, handle.clone()))
    }

    pub fn contains(&self, class: ObjectClass, handle: &Handle) -> bool {
        self.get(class, handle).is_some()
    }

    pub fn count(&self, class: ObjectClass) -> usize {
        self.objects.keys().filter(|(c, _)| *c == class).count()
    }

    pub fn reference(&self, handle: &ChangeHandle) -> Option<&JsonValue> {
        self.references.get(&reference_key(handle))
    }

    pub fn emitted(&self) -> &[EmittedSignal] {
        &self.emitted
    }

    pub fn take_emitted(&mut self) -> Vec<EmittedSignal> {
        std::mem::take(&mut self.emitted)
    }

    pub fn labels(&self) -> &HistoryLabels {
        &self.labels
    }

    pub fn in_transaction(&self) -> bool {
        self.open_txn.is_some()
    }

    /// Object state without emitted signals or labels, for state comparisons.
    pub fn objects(&self) -> &BTreeMap<(ObjectClass, Handle), JsonValue> {
        &self.objects
    }
}

impl PrimaryDatabase for MemoryDatabase {
    fn txn_begin(&mut self) -> Result<(), PrimaryError> {
        if self.open_txn.is_some() {
            return Err("transaction already open".into());
        }
        self.open_txn = Some(Snapshot {
            objects: self.objects.clone(),
            references: self.references.clone(),
            emitted: self.emitted.len(),
        });
        Ok(())
    }

    fn txn_commit(&mut self) -> Result<(), PrimaryError> {
        self.open_txn
            .take()
            .map(|_| ())
            .ok_or_else(|| "no open transaction".into())
    }

    fn txn_abort(&mut self) -> Result<(), PrimaryError> {
        let snapshot = self.open_txn.take().ok_or("no open transaction")?;
        self.objects = snapshot.objects;
        self.references = snapshot.references;
        self.emitted.truncate(snapshot.emitted);
        Ok(())
    }

    fn get_data(&self, handle: &Handle, class: ObjectClass) -> Result<Option<Payload>, PrimaryError> {
        Ok(self.get(class, handle).cloned().map(Payload::new))
    }

    fn undo_data(
        &mut self,
        data: Option<&Payload>,
        handle: &Handle,
        class: ObjectClass,
    ) -> Result<(), PrimaryError> {
        let key = (class, handle.clone());
        match data {
            Some(payload) => {
                self.objects.insert(key, payload.as_json().clone());
            }
            None => {
                self.objects.remove(&key);
            }
        }
        Ok(())
    }

    fn undo_reference(
        &mut self,
        data: Option<&Payload>,
        handle: &ChangeHandle,
    ) -> Result<(), PrimaryError> {
        let key = reference_key(handle);
        match data {
            Some(payload) => {
                self.references.insert(key, payload.as_json().clone());
            }
            None => {
                self.references.remove(&key);
            }
        }
        Ok(())
    }

    fn emit(&mut self, signal: &str, handles: &[Handle]) -> Result<(), PrimaryError> {
        self.emitted.push(EmittedSignal {
            name: signal.to_string(),
            handles: handles.to_vec(),
        });
        Ok(())
    }

    fn on_history_change(&mut self, labels: &HistoryLabels) {
        self.labels = labels.clone();
    }
}

fn reference_key(handle: &ChangeHandle) -> ReferenceKey {
    (handle.obj_handle().clone(), handle.ref_handle().cloned())
}
