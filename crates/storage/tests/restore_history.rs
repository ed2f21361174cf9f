#![forbid(unsafe_code)]

mod common;

use common::{add_people, file_config, handle};
use tempfile::TempDir;
use tl_core::ObjectClass;
use tl_storage::{HistoryLabels, MemoryDatabase, UndoEngine, UndoLog};

#[test]
fn stacks_are_rebuilt_from_stored_transactions() {
    let dir = TempDir::new().expect("temp dir");
    let mut engine = UndoEngine::open(&file_config(&dir), MemoryDatabase::new()).expect("open");
    add_people(&mut engine, "Add A", &[("A", "a")]);
    add_people(&mut engine, "Add B", &[("B", "b")]);
    add_people(&mut engine, "Add C", &[("C", "c")]);
    engine.undo().expect("undo C").expect("undone");
    engine.undo().expect("undo B").expect("undone");
    engine.redo().expect("redo B").expect("redone");

    let connection_id = engine.log_mut().connection_id().expect("connection");
    let (log, db) = engine.into_parts();
    log.close().expect("close");

    let config = file_config(&dir).with_resume_connection(Some(connection_id));
    let mut engine = UndoEngine::open(&config, db).expect("reopen");
    assert_eq!(engine.undo_count(), 2);
    assert_eq!(engine.redo_count(), 1);
    assert_eq!(engine.database().labels(), &HistoryLabels {
        undo: Some("_Undo Add B".to_string()),
        redo: Some("_Redo Add C".to_string()),
    });
    let descriptions: Vec<&str> = engine
        .undo_history()
        .map(|h| h.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["Add A", "Add B"]);

    engine.redo().expect("redo C").expect("redone");
    assert!(engine.database().contains(ObjectClass::Person, &handle("C")));
    for _ in 0..3 {
        engine.undo().expect("undo").expect("undone");
    }
    assert_eq!(engine.database().count(ObjectClass::Person), 0);
}

#[test]
fn commit_after_undo_drops_redo_on_restore() {
    let dir = TempDir::new().expect("temp dir");
    let mut engine = UndoEngine::open(&file_config(&dir), MemoryDatabase::new()).expect("open");
    add_people(&mut engine, "Add A", &[("A", "a")]);
    engine.undo().expect("undo A").expect("undone");
    add_people(&mut engine, "Add B", &[("B", "b")]);
    let connection_id = engine.log_mut().connection_id().expect("connection");
    let (log, db) = engine.into_parts();
    log.close().expect("close");

    let log = UndoLog::open(&file_config(&dir).with_resume_connection(Some(connection_id)))
        .expect("reopen log");
    let engine = UndoEngine::restore(log, db).expect("restore");
    assert_eq!(engine.undo_count(), 1);
    assert_eq!(engine.redo_count(), 0);
    assert_eq!(engine.peek_undo().map(|h| h.description.as_str()), Some("Add B"));
}

#[test]
fn fresh_connection_restores_empty_stacks() {
    let dir = TempDir::new().expect("temp dir");
    let mut engine = UndoEngine::open(&file_config(&dir), MemoryDatabase::new()).expect("open");
    add_people(&mut engine, "Add A", &[("A", "a")]);
    let (log, db) = engine.into_parts();
    log.close().expect("close");

    let log = UndoLog::open(&file_config(&dir)).expect("reopen without resume");
    let engine = UndoEngine::restore(log, db).expect("restore");
    assert_eq!(engine.undo_count(), 0);
    assert_eq!(engine.redo_count(), 0);
}
