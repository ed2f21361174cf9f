#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use tl_core::ids::Handle;
use tl_core::{ObjectClass, TransType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReplayDirection {
    Undo,
    Redo,
}

/// Emission order is the declaration order: deletes, then adds, then updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignalKind {
    Delete,
    Add,
    Update,
}

impl SignalKind {
    const ORDER: [SignalKind; 3] = [Self::Delete, Self::Add, Self::Update];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Delete => "-delete",
            Self::Add => "-add",
            Self::Update => "-update",
        }
    }

    /// Undoing an add removes the object; undoing a delete brings it back.
    pub fn for_replay(trans_type: TransType, direction: ReplayDirection) -> Self {
        match (trans_type, direction) {
            (TransType::Update, _) => Self::Update,
            (TransType::Add, ReplayDirection::Redo) | (TransType::Delete, ReplayDirection::Undo) => {
                Self::Add
            }
            (TransType::Delete, ReplayDirection::Redo) | (TransType::Add, ReplayDirection::Undo) => {
                Self::Delete
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    pub class: ObjectClass,
    pub kind: SignalKind,
    pub handles: Vec<Handle>,
}

impl Signal {
    /// e.g. `person-delete`.
    pub fn name(&self) -> String {
        format!("{}{}", self.class.signal_name(), self.kind.suffix())
    }
}

/// Handles touched by one replay, grouped per class and signal kind.
#[derive(Clone, Debug)]
pub(crate) struct SignalBatch {
    direction: ReplayDirection,
    groups: BTreeMap<(ObjectClass, SignalKind), Vec<Handle>>,
}

impl SignalBatch {
    pub(crate) fn new(direction: ReplayDirection) -> Self {
        Self {
            direction,
            groups: BTreeMap::new(),
        }
    }

    pub(crate) fn note(&mut self, class: ObjectClass, trans_type: TransType, handle: &Handle) {
        let kind = SignalKind::for_replay(trans_type, self.direction);
        let group = self.groups.entry((class, kind)).or_default();
        if !group.contains(handle) {
            group.push(handle.clone());
        }
    }

    /// Non-empty signals in emission order. Add and update groups drop
    /// handles that the same class also deletes.
    pub(crate) fn signals(&self) -> Vec<Signal> {
        let mut out = Vec::new();
        for kind in SignalKind::ORDER {
            for class in ObjectClass::ALL {
                let Some(handles) = self.groups.get(&(class, kind)) else {
                    continue;
                };
                let deleted = match kind {
                    SignalKind::Delete => None,
                    SignalKind::Add | SignalKind::Update => {
                        self.groups.get(&(class, SignalKind::Delete))
                    }
                };
                let handles: Vec<Handle> = handles
                    .iter()
                    .filter(|h| deleted.is_none_or(|d| !d.contains(h)))
                    .cloned()
                    .collect();
                if !handles.is_empty() {
                    out.push(Signal {
                        class,
                        kind,
                        handles,
                    });
                }
            }
        }
        out
    }
}
