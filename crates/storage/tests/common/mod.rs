#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use tl_core::ObjectClass;
use tl_core::Payload;
use tl_core::ids::{ChangeHandle, Handle};
use tl_storage::{
    MemoryDatabase, NewChange, TransactionHandle, UndoEngine, UndoLog, UndoLogConfig,
};

#[ctor::ctor]
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(tracing::Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .try_init();
}

pub fn handle(value: &str) -> Handle {
    Handle::try_new(value).expect("valid handle")
}

pub fn object(value: &str) -> ChangeHandle {
    ChangeHandle::Object(handle(value))
}

pub fn person(name: &str) -> Payload {
    Payload::new(json!({ "name": name }))
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("undo.db")
}

pub fn file_config(dir: &TempDir) -> UndoLogConfig {
    UndoLogConfig::file(db_path(dir))
        .with_tree_id(Some(7))
        .with_user_id(Some("alice".to_string()))
}

pub fn memory_engine() -> UndoEngine<MemoryDatabase> {
    let log = UndoLog::open(&UndoLogConfig::memory()).expect("open in-memory log");
    UndoEngine::new(log, MemoryDatabase::new())
}

/// Commits one transaction adding a person per `(handle, name)`.
pub fn add_people(
    engine: &mut UndoEngine<MemoryDatabase>,
    description: &str,
    people: &[(&str, &str)],
) -> TransactionHandle {
    let mut pending = engine.begin(description);
    for (h, name) in people {
        engine
            .write(
                &mut pending,
                &NewChange::add(ObjectClass::Person, object(h), person(name)),
            )
            .expect("write add");
    }
    engine.commit(pending).expect("commit")
}
