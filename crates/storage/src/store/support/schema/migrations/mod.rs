#![forbid(unsafe_code)]

mod changes;
mod util;

use super::super::super::StoreError;
use rusqlite::Connection;

pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    changes::apply(conn)?;
    Ok(())
}
