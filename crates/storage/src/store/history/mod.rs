#![forbid(unsafe_code)]

mod export;
mod list;
mod reserialize;

use super::changes::{RawChangeRow, SELECT_CHANGE_COLUMNS, raw_change_row};
use super::rows::ns_to_seconds;
use super::{ChangeView, ConnectionView, StoreError, TransactionRow, TransactionView};
use rusqlite::{Connection, params};
use serde_json::Value as JsonValue;
use tl_core::{Payload, empty_object, rehydrate};
use tracing::warn;

/// Progress callback for bulk history operations: `(done, total)`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize);

// A transaction is visible when it covers no changes or at least one of its
// changes is still present for its connection.
const VISIBLE_IN_TREE: &str = r#"
    c.tree_id IS ?1
    AND (
      t."first" IS NULL
      OR EXISTS (
        SELECT 1 FROM changes ch
        WHERE ch.connection_id = t.connection_id
          AND ch.id >= t."first"
          AND ch.id <= t."last"
      )
    )
"#;

struct ConnectionFields {
    user_id: Option<String>,
    timestamp_ns: i64,
}

fn build_view(
    conn: &Connection,
    row: TransactionRow,
    connection: ConnectionFields,
    old_data: bool,
    new_data: bool,
) -> Result<TransactionView, StoreError> {
    let changes = match (row.first, row.last) {
        (Some(first), Some(last)) => {
            load_change_views(conn, row.connection_id, first, last, old_data, new_data)?
        }
        _ => Vec::new(),
    };
    Ok(TransactionView {
        id: row.id,
        connection: ConnectionView {
            id: row.connection_id,
            user_id: connection.user_id,
            timestamp: ns_to_seconds(connection.timestamp_ns),
        },
        description: row.description,
        first: row.first,
        last: row.last,
        undo: row.undo,
        timestamp: ns_to_seconds(row.timestamp_ns),
        changes,
    })
}

fn load_change_views(
    conn: &Connection,
    connection_id: i64,
    first: i64,
    last: i64,
    old_data: bool,
    new_data: bool,
) -> Result<Vec<ChangeView>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_CHANGE_COLUMNS} FROM changes WHERE connection_id=?1 AND id>=?2 AND id<=?3 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map(params![connection_id, first, last], raw_change_row)?;
    let mut out = Vec::new();
    for raw in rows {
        out.push(change_view(raw?, old_data, new_data));
    }
    Ok(out)
}

fn change_view(raw: RawChangeRow, old_data: bool, new_data: bool) -> ChangeView {
    let (id, _connection_id, obj_class, trans_type, obj_handle, ref_handle, old, new, timestamp) =
        raw;
    let old_data = old_data.then(|| payload_for_display(&obj_class, old.as_deref()));
    let new_data = new_data.then(|| payload_for_display(&obj_class, new.as_deref()));
    ChangeView {
        id,
        obj_class,
        trans_type,
        obj_handle,
        ref_handle,
        timestamp: ns_to_seconds(timestamp),
        old_data,
        new_data,
    }
}

/// Display never fails on a single bad field: undecodable payloads and
/// unknown classes show up as `{}`.
fn payload_for_display(obj_class: &str, blob: Option<&[u8]>) -> JsonValue {
    let Some(blob) = blob else {
        return empty_object();
    };
    let payload = match Payload::decode(blob) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(obj_class, "undecodable history payload: {err}");
            return empty_object();
        }
    };
    match rehydrate(obj_class, &payload) {
        Ok(value) => value,
        Err(err) => {
            warn!(obj_class, "cannot rehydrate history payload: {err}");
            empty_object()
        }
    }
}
