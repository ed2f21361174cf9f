#![forbid(unsafe_code)]

use tl_core::ids::ChangeHandle;
use tl_core::{ObjectClass, Payload, TransType};

/// One object mutation handed to [`super::UndoLog::append`].
#[derive(Clone, Debug, PartialEq)]
pub struct NewChange {
    pub obj_class: ObjectClass,
    pub trans_type: TransType,
    pub handle: ChangeHandle,
    pub old: Option<Payload>,
    pub new: Option<Payload>,
}

impl NewChange {
    pub fn add(obj_class: ObjectClass, handle: ChangeHandle, new: Payload) -> Self {
        Self {
            obj_class,
            trans_type: TransType::Add,
            handle,
            old: None,
            new: Some(new),
        }
    }

    pub fn update(obj_class: ObjectClass, handle: ChangeHandle, old: Payload, new: Payload) -> Self {
        Self {
            obj_class,
            trans_type: TransType::Update,
            handle,
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn delete(obj_class: ObjectClass, handle: ChangeHandle, old: Payload) -> Self {
        Self {
            obj_class,
            trans_type: TransType::Delete,
            handle,
            old: Some(old),
            new: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        match (self.trans_type, self.old.is_some(), self.new.is_some()) {
            (TransType::Add, false, true) => Ok(()),
            (TransType::Update, true, true) => Ok(()),
            (TransType::Delete, true, false) => Ok(()),
            (TransType::Add, _, _) => Err("add change needs a new payload and no old payload"),
            (TransType::Update, _, _) => Err("update change needs old and new payloads"),
            (TransType::Delete, _, _) => Err("delete change needs an old payload and no new payload"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Commit,
    Undo,
    Redo,
}

impl TransactionKind {
    pub fn label(self, description: &str) -> String {
        match self {
            Self::Commit => description.to_string(),
            Self::Undo => format!("_Undo {description}"),
            Self::Redo => format!("_Redo {description}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordTransactionRequest {
    pub description: String,
    /// 0-based change indices; both set or both unset.
    pub first: Option<usize>,
    pub last: Option<usize>,
    /// Commit time of the original transaction. Ignored for undo/redo rows,
    /// which are stamped with the current time.
    pub timestamp_ns: i64,
    pub kind: TransactionKind,
}

/// Filters for the paginated history listing.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionsRequest {
    /// 1-based page; 0 together with any `pagesize` disables pagination.
    pub page: usize,
    pub pagesize: usize,
    pub old_data: bool,
    pub new_data: bool,
    pub ascending: bool,
    /// Exclusive upper bound, seconds since the epoch.
    pub before: Option<f64>,
    /// Inclusive lower bound, seconds since the epoch: a transaction stamped
    /// exactly at `after` is listed. Callers used to a strict
    /// `timestamp > after` filter get one more row at the boundary.
    pub after: Option<f64>,
}

impl Default for TransactionsRequest {
    fn default() -> Self {
        Self {
            page: 1,
            pagesize: 20,
            old_data: true,
            new_data: true,
            ascending: true,
            before: None,
            after: None,
        }
    }
}

impl TransactionsRequest {
    pub fn all() -> Self {
        Self {
            page: 0,
            pagesize: 0,
            ..Self::default()
        }
    }
}
