#![forbid(unsafe_code)]

use super::{
    ChangeRecord, NewChange, StoreError, UndoLog, index_to_seq, seq_to_index, support,
};
use rusqlite::{OptionalExtension, Transaction, params};
use tl_core::ids::{ChangeHandle, Handle};
use tl_core::{ObjectClass, Payload, TransType};
use tracing::debug;

pub(super) type RawChangeRow = (
    i64,
    i64,
    String,
    i64,
    String,
    Option<String>,
    Option<Vec<u8>>,
    Option<Vec<u8>>,
    i64,
);

pub(super) const SELECT_CHANGE_COLUMNS: &str = "id, connection_id, obj_class, trans_type, obj_handle, ref_handle, old_payload, new_payload, timestamp";

impl UndoLog {
    /// Appends a change to the current connection and returns its 0-based index.
    pub fn append(&mut self, change: &NewChange) -> Result<usize, StoreError> {
        change.validate().map_err(StoreError::InvalidInput)?;
        let (old_blob, new_blob) = encode_payloads(change)?;
        let connection_id = self.connection_id()?;
        let now = support::now_ns();

        let tx = self.conn.transaction()?;
        let seq = max_seq_tx(&tx, connection_id)? + 1;
        tx.execute(
            r#"
            INSERT INTO changes(id, connection_id, obj_class, trans_type, obj_handle, ref_handle, old_payload, new_payload, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                seq,
                connection_id,
                change.obj_class.name(),
                change.trans_type.code(),
                change.handle.obj_handle().as_str(),
                change.handle.ref_handle().map(Handle::as_str),
                old_blob,
                new_blob,
                now
            ],
        )?;
        tx.commit()?;

        debug!(
            connection_id,
            seq,
            obj_class = change.obj_class.name(),
            trans_type = change.trans_type.as_str(),
            "appended change"
        );
        seq_to_index(seq)
    }

    pub fn get_by_index(&mut self, index: usize) -> Result<ChangeRecord, StoreError> {
        let connection_id = self.connection_id()?;
        let seq = index_to_seq(index)?;
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SELECT_CHANGE_COLUMNS} FROM changes WHERE connection_id=?1 AND id=?2"
                ),
                params![connection_id, seq],
                raw_change_row,
            )
            .optional()?
            .ok_or(StoreError::IndexOutOfRange { index })?;
        decode_change(raw)
    }

    /// Overwrites the change at `index`, stamping it with the current time.
    pub fn set_by_index(&mut self, index: usize, change: &NewChange) -> Result<(), StoreError> {
        change.validate().map_err(StoreError::InvalidInput)?;
        let connection_id = self.connection_id()?;
        let seq = index_to_seq(index)?;

        let tx = self.conn.transaction()?;
        if !overwrite_change_tx(&tx, connection_id, seq, change)? {
            return Err(StoreError::IndexOutOfRange { index });
        }
        tx.commit()?;
        debug!(connection_id, seq, "overwrote change");
        Ok(())
    }

    /// Highest sequence id recorded for the current connection.
    pub fn len(&mut self) -> Result<usize, StoreError> {
        let connection_id = self.connection_id()?;
        let tx = self.conn.transaction()?;
        let max = max_seq_tx(&tx, connection_id)?;
        tx.commit()?;
        Ok(usize::try_from(max).unwrap_or_default())
    }

    pub fn is_empty(&mut self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn max_seq_tx(tx: &Transaction<'_>, connection_id: i64) -> Result<i64, StoreError> {
    Ok(tx.query_row(
        "SELECT COALESCE(MAX(id), 0) FROM changes WHERE connection_id=?1",
        params![connection_id],
        |row| row.get::<_, i64>(0),
    )?)
}

/// Returns `false` when no change with that sequence id exists.
pub(super) fn overwrite_change_tx(
    tx: &Transaction<'_>,
    connection_id: i64,
    seq: i64,
    change: &NewChange,
) -> Result<bool, StoreError> {
    let (old_blob, new_blob) = encode_payloads(change)?;
    let updated = tx.execute(
        r#"
        UPDATE changes
        SET obj_class=?3, trans_type=?4, obj_handle=?5, ref_handle=?6, old_payload=?7, new_payload=?8, timestamp=?9
        WHERE connection_id=?1 AND id=?2
        "#,
        params![
            connection_id,
            seq,
            change.obj_class.name(),
            change.trans_type.code(),
            change.handle.obj_handle().as_str(),
            change.handle.ref_handle().map(Handle::as_str),
            old_blob,
            new_blob,
            support::now_ns()
        ],
    )?;
    Ok(updated > 0)
}

fn encode_payloads(change: &NewChange) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>), StoreError> {
    let old = change.old.as_ref().map(Payload::encode).transpose()?;
    let new = change.new.as_ref().map(Payload::encode).transpose()?;
    Ok((old, new))
}

pub(super) fn raw_change_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawChangeRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

pub(super) fn decode_change(raw: RawChangeRow) -> Result<ChangeRecord, StoreError> {
    let (seq, connection_id, obj_class, trans_type, obj_handle, ref_handle, old, new, timestamp_ns) =
        raw;
    let obj_class = ObjectClass::from_stored(&obj_class)
        .ok_or(StoreError::InvalidInput("unknown object class in change log"))?;
    let trans_type = TransType::from_code(trans_type)
        .map_err(|_| StoreError::InvalidInput("unknown trans_type in change log"))?;
    let obj_handle = Handle::try_new(obj_handle)
        .map_err(|_| StoreError::InvalidInput("invalid obj_handle in change log"))?;
    let ref_handle = ref_handle
        .filter(|value| !value.is_empty())
        .map(Handle::try_new)
        .transpose()
        .map_err(|_| StoreError::InvalidInput("invalid ref_handle in change log"))?;

    Ok(ChangeRecord {
        seq,
        connection_id,
        obj_class,
        trans_type,
        handle: ChangeHandle::from_parts(obj_handle, ref_handle),
        old: old.as_deref().map(Payload::decode).transpose()?,
        new: new.as_deref().map(Payload::decode).transpose()?,
        timestamp_ns,
    })
}
