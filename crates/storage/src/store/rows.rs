#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::Value as JsonValue;
use tl_core::ids::ChangeHandle;
use tl_core::{ObjectClass, Payload, TransType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionRow {
    pub id: i64,
    pub tree_id: Option<i64>,
    pub user_id: Option<String>,
    pub timestamp_ns: i64,
}

/// A stored change decoded for replay.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    /// 1-based sequence id within the owning connection.
    pub seq: i64,
    pub connection_id: i64,
    pub obj_class: ObjectClass,
    pub trans_type: TransType,
    pub handle: ChangeHandle,
    pub old: Option<Payload>,
    pub new: Option<Payload>,
    pub timestamp_ns: i64,
}

impl ChangeRecord {
    pub fn index(&self) -> usize {
        usize::try_from(self.seq - 1).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRow {
    pub id: i64,
    pub connection_id: i64,
    pub description: String,
    /// Sequence ids (1-based) of the first and last change covered.
    pub first: Option<i64>,
    pub last: Option<i64>,
    pub undo: bool,
    pub timestamp_ns: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConnectionView {
    pub id: i64,
    pub user_id: Option<String>,
    pub timestamp: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChangeView {
    pub id: i64,
    pub obj_class: String,
    pub trans_type: i64,
    pub obj_handle: String,
    pub ref_handle: Option<String>,
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_data: Option<JsonValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionView {
    pub id: i64,
    pub connection: ConnectionView,
    pub description: String,
    pub first: Option<i64>,
    pub last: Option<i64>,
    pub undo: bool,
    pub timestamp: f64,
    pub changes: Vec<ChangeView>,
}

pub(crate) fn ns_to_seconds(timestamp_ns: i64) -> f64 {
    timestamp_ns as f64 / 1e9
}

pub(crate) fn seconds_to_ns(seconds: f64) -> i64 {
    (seconds * 1e9) as i64
}
