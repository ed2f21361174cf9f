#![forbid(unsafe_code)]

use super::super::super::super::StoreError;
use super::util::{ensure_column, table_columns};
use rusqlite::Connection;
use tracing::info;

/// Text columns the first history writer stored object JSON in.
const LEGACY_PAYLOAD_COLUMNS: [(&str, &str); 2] =
    [("old_json", "old_payload"), ("new_json", "new_payload")];

pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    ensure_column(conn, "changes", "old_payload", "BLOB DEFAULT NULL")?;
    ensure_column(conn, "changes", "new_payload", "BLOB DEFAULT NULL")?;
    move_legacy_json(conn)
}

/// Moves JSON text from `old_json`/`new_json` into the payload columns as
/// bare (legacy-encoded) JSON and clears the text, so a later rewrite of the
/// payload is never overwritten by stale text on the next open.
fn move_legacy_json(conn: &Connection) -> Result<(), StoreError> {
    let columns = table_columns(conn, "changes")?;
    for (text_column, payload_column) in LEGACY_PAYLOAD_COLUMNS {
        if !columns.iter().any(|name| name == text_column) {
            continue;
        }
        let moved = conn.execute(
            &format!(
                r#"
                UPDATE changes
                SET {payload_column} = COALESCE({payload_column}, CAST(NULLIF({text_column}, '') AS BLOB)),
                    {text_column} = NULL
                WHERE {text_column} IS NOT NULL
                "#
            ),
            [],
        )?;
        if moved > 0 {
            info!(moved, column = text_column, "moved legacy json payloads");
        }
    }
    Ok(())
}
