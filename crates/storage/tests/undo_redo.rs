#![forbid(unsafe_code)]

mod common;

use common::{add_people, handle, memory_engine, object, person};
use tl_core::ids::{ChangeHandle, Handle};
use tl_core::{ObjectClass, Payload};
use tl_storage::{
    HistoryLabels, MemoryDatabase, NewChange, PrimaryDatabase, PrimaryError, ReplayDirection,
    SignalKind, StoreError, TransactionsRequest, UndoEngine, UndoLog, UndoLogConfig,
};

#[test]
fn undo_of_added_objects_removes_them_and_logs_undo_row() {
    let mut engine = memory_engine();
    add_people(&mut engine, "Add test objects", &[("H1", "Ada"), ("H2", "Grace")]);
    assert!(engine.database().contains(ObjectClass::Person, &handle("H1")));
    assert_eq!(engine.undo_label().as_deref(), Some("_Undo Add test objects"));

    let report = engine.undo().expect("undo").expect("something to undo");
    assert_eq!(report.direction, ReplayDirection::Undo);
    assert_eq!(report.recorded.description, "_Undo Add test objects");
    assert!(report.recorded.undo);
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H1")));
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H2")));

    let emitted = engine.database().emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].name, "person-delete");
    assert_eq!(emitted[0].handles, vec![handle("H2"), handle("H1")]);

    let (rows, total) = engine
        .log()
        .get_transactions(&TransactionsRequest::all())
        .expect("history");
    assert_eq!(total, 2);
    assert_eq!(rows[1].description, "_Undo Add test objects");
    assert_eq!(rows[1].first, rows[0].first);
    assert_eq!(rows[1].last, rows[0].last);
}

#[test]
fn undo_then_redo_restores_state() {
    let mut engine = memory_engine();
    add_people(&mut engine, "Add Ada", &[("H1", "Ada")]);

    let mut pending = engine.begin("Rename Ada");
    engine
        .write(
            &mut pending,
            &NewChange::update(
                ObjectClass::Person,
                object("H1"),
                person("Ada"),
                person("Ada Lovelace"),
            ),
        )
        .expect("write update");
    engine.commit(pending).expect("commit");
    let after_commit = engine.database().objects().clone();

    engine.undo().expect("undo").expect("undone");
    assert_eq!(
        engine.database().get(ObjectClass::Person, &handle("H1")),
        Some(person("Ada").as_json())
    );
    assert_eq!(engine.redo_label().as_deref(), Some("_Redo Rename Ada"));

    let report = engine.redo().expect("redo").expect("redone");
    assert_eq!(report.recorded.description, "_Redo Rename Ada");
    assert!(!report.recorded.undo);
    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.signals[0].kind, SignalKind::Update);
    assert_eq!(engine.database().objects(), &after_commit);
    assert_eq!(engine.undo_count(), 2);
    assert_eq!(engine.redo_count(), 0);
}

#[test]
fn commit_clears_redo_stack() {
    let mut engine = memory_engine();
    add_people(&mut engine, "Add Ada", &[("H1", "Ada")]);
    engine.undo().expect("undo");
    assert_eq!(engine.redo_count(), 1);

    add_people(&mut engine, "Add Grace", &[("H2", "Grace")]);
    assert_eq!(engine.redo_count(), 0);
    assert!(engine.redo().expect("redo").is_none());
    assert_eq!(engine.database().labels(), &HistoryLabels {
        undo: Some("_Undo Add Grace".to_string()),
        redo: None,
    });
}

#[test]
fn empty_stacks_are_noops() {
    let mut engine = memory_engine();
    assert!(engine.undo().expect("undo").is_none());
    assert!(engine.redo().expect("redo").is_none());
    assert!(engine.database().emitted().is_empty());
    let (_, total) = engine
        .log()
        .get_transactions(&TransactionsRequest::all())
        .expect("history");
    assert_eq!(total, 0);
}

#[test]
fn delete_undo_redo_grows_history_not_changes() {
    let mut engine = memory_engine();
    add_people(&mut engine, "Add Ada", &[("H1", "Ada")]);

    let mut pending = engine.begin("Delete Ada");
    engine
        .write(
            &mut pending,
            &NewChange::delete(ObjectClass::Person, object("H1"), person("Ada")),
        )
        .expect("write delete");
    engine.commit(pending).expect("commit");
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H1")));
    let changes = engine.log_mut().len().expect("len");

    engine.undo().expect("undo").expect("undone");
    assert!(engine.database().contains(ObjectClass::Person, &handle("H1")));
    assert_eq!(engine.database().emitted()[0].name, "person-add");

    engine.redo().expect("redo").expect("redone");
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H1")));
    assert_eq!(engine.database().emitted()[1].name, "person-delete");

    assert_eq!(engine.log_mut().len().expect("len"), changes);
    let (_, total) = engine
        .log()
        .get_transactions(&TransactionsRequest::all())
        .expect("history");
    assert_eq!(total, 4);
}

#[test]
fn reference_changes_replay_without_signals() {
    let mut engine = memory_engine();
    let reference = ChangeHandle::from_parts(handle("P1"), Some(handle("E1")));
    let mut pending = engine.begin("Link event");
    engine
        .write(
            &mut pending,
            &NewChange::add(
                ObjectClass::Reference,
                reference.clone(),
                Payload::new(serde_json::json!(["P1", "Person", "E1", "Event"])),
            ),
        )
        .expect("write reference");
    engine.commit(pending).expect("commit");
    assert!(engine.database().reference(&reference).is_some());

    let report = engine.undo().expect("undo").expect("undone");
    assert!(report.signals.is_empty());
    assert!(engine.database().reference(&reference).is_none());
}

#[test]
fn undo_depth_is_bounded() {
    let log = UndoLog::open(&UndoLogConfig::memory().with_max_undo_depth(2)).expect("open log");
    let mut engine = UndoEngine::new(log, MemoryDatabase::new());
    add_people(&mut engine, "one", &[("H1", "a")]);
    add_people(&mut engine, "two", &[("H2", "b")]);
    add_people(&mut engine, "three", &[("H3", "c")]);
    assert_eq!(engine.undo_count(), 2);

    engine.undo().expect("undo three");
    engine.undo().expect("undo two");
    assert!(engine.undo().expect("nothing left").is_none());
    assert!(engine.database().contains(ObjectClass::Person, &handle("H1")));
}

/// Delegates to [`MemoryDatabase`] but refuses to touch one handle.
#[derive(Debug, Default)]
struct FailingDatabase {
    inner: MemoryDatabase,
    poisoned: Option<Handle>,
    aborts: usize,
}

impl PrimaryDatabase for FailingDatabase {
    fn txn_begin(&mut self) -> Result<(), PrimaryError> {
        self.inner.txn_begin()
    }

    fn txn_commit(&mut self) -> Result<(), PrimaryError> {
        self.inner.txn_commit()
    }

    fn txn_abort(&mut self) -> Result<(), PrimaryError> {
        self.aborts += 1;
        self.inner.txn_abort()
    }

    fn get_data(&self, handle: &Handle, class: ObjectClass) -> Result<Option<Payload>, PrimaryError> {
        if self.poisoned.as_ref() == Some(handle) {
            return Err(format!("cannot read {handle}").into());
        }
        self.inner.get_data(handle, class)
    }

    fn undo_data(
        &mut self,
        data: Option<&Payload>,
        handle: &Handle,
        class: ObjectClass,
    ) -> Result<(), PrimaryError> {
        if self.poisoned.as_ref() == Some(handle) {
            return Err(format!("cannot write {handle}").into());
        }
        self.inner.undo_data(data, handle, class)
    }

    fn undo_reference(
        &mut self,
        data: Option<&Payload>,
        handle: &ChangeHandle,
    ) -> Result<(), PrimaryError> {
        self.inner.undo_reference(data, handle)
    }

    fn emit(&mut self, signal: &str, handles: &[Handle]) -> Result<(), PrimaryError> {
        self.inner.emit(signal, handles)
    }

    fn on_history_change(&mut self, labels: &HistoryLabels) {
        self.inner.on_history_change(labels);
    }
}

#[test]
fn failed_replay_rolls_back_and_keeps_stacks() {
    let log = UndoLog::open(&UndoLogConfig::memory()).expect("open log");
    let mut engine = UndoEngine::new(log, FailingDatabase::default());
    let mut pending = engine.begin("Add two");
    for (h, name) in [("H1", "Ada"), ("H2", "Grace")] {
        engine
            .write(
                &mut pending,
                &NewChange::add(ObjectClass::Person, object(h), person(name)),
            )
            .expect("write");
    }
    engine.commit(pending).expect("commit");
    let before = engine.database().inner.objects().clone();

    // Undo walks the changes newest first, so H2 is removed before H1 fails.
    engine.database_mut().poisoned = Some(handle("H1"));
    let err = engine.undo().expect_err("poisoned handle");
    assert!(matches!(err, StoreError::Primary(_)));
    assert_eq!(err.code(), "PRIMARY_DB");

    let db = engine.database();
    assert_eq!(db.aborts, 1);
    assert!(!db.inner.in_transaction());
    assert_eq!(db.inner.objects(), &before);
    assert!(db.inner.emitted().is_empty());
    assert_eq!(engine.undo_count(), 1);
    assert_eq!(engine.redo_count(), 0);
    let (_, total) = engine
        .log()
        .get_transactions(&TransactionsRequest::all())
        .expect("history");
    assert_eq!(total, 1);

    engine.database_mut().poisoned = None;
    engine.undo().expect("undo").expect("undone");
    assert_eq!(engine.database().inner.count(ObjectClass::Person), 0);
}

#[test]
fn unreadable_object_is_a_failed_check() {
    let log = UndoLog::open(&UndoLogConfig::memory()).expect("open log");
    let mut engine = UndoEngine::new(log, FailingDatabase::default());
    let mut pending = engine.begin("Add two");
    for (h, name) in [("H1", "Ada"), ("H2", "Grace")] {
        engine
            .write(
                &mut pending,
                &NewChange::add(ObjectClass::Person, object(h), person(name)),
            )
            .expect("write");
    }
    let added = engine.commit(pending).expect("commit");

    engine.database_mut().poisoned = Some(handle("H2"));
    let check = engine.check_undo(added.transaction_id).expect("check");
    assert!(!check.can_undo_without_force);
    assert_eq!(check.conflicts.len(), 1);
    assert_eq!(check.conflicts[0].kind, tl_storage::ConflictKind::CheckFailed);
    assert_eq!(check.conflicts[0].change_index, 1);

    let report = engine
        .undo_transaction(added.transaction_id, false)
        .expect("undo the readable change");
    assert_eq!((report.applied, report.skipped), (1, 1));
    assert!(!engine.database().inner.contains(ObjectClass::Person, &handle("H1")));
    assert!(engine.database().inner.contains(ObjectClass::Person, &handle("H2")));
}
