#![forbid(unsafe_code)]

mod common;

use common::{add_people, handle, memory_engine, object, person};
use tl_core::ObjectClass;
use tl_core::ids::ChangeHandle;
use tl_storage::{
    ConflictKind, MemoryDatabase, NewChange, StoreError, TransactionHandle, TransactionsRequest,
    UndoEngine,
};

fn commit_one(
    engine: &mut UndoEngine<MemoryDatabase>,
    description: &str,
    change: NewChange,
) -> TransactionHandle {
    let mut pending = engine.begin(description);
    engine.write(&mut pending, &change).expect("write");
    engine.commit(pending).expect("commit")
}

fn rename(engine: &mut UndoEngine<MemoryDatabase>, h: &str, from: &str, to: &str) -> TransactionHandle {
    commit_one(
        engine,
        "Edit person",
        NewChange::update(ObjectClass::Person, object(h), person(from), person(to)),
    )
}

#[test]
fn untouched_transaction_undoes_without_force() {
    let mut engine = memory_engine();
    let added = add_people(&mut engine, "Add people", &[("H1", "Ada"), ("H2", "Grace")]);

    let check = engine.check_undo(added.transaction_id).expect("check");
    assert!(check.can_undo_without_force);
    assert_eq!(check.total_changes, 2);
    assert!(check.conflicts.is_empty());

    engine.database_mut().take_emitted();
    let report = engine
        .undo_transaction(added.transaction_id, false)
        .expect("undo by id");
    assert_eq!(report.applied, 2);
    assert_eq!(report.skipped, 0);
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H1")));
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H2")));

    let emitted = engine.database().emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].name, "person-delete");
    assert_eq!(emitted[0].handles, vec![handle("H2"), handle("H1")]);

    let recorded = report.transaction.expect("new transaction");
    assert_eq!(recorded.description, "_Undo Add people");
    assert_eq!(engine.peek_undo(), Some(&recorded));
    assert_eq!(engine.redo_count(), 0);

    let (rows, total) = engine
        .log()
        .get_transactions(&TransactionsRequest::all())
        .expect("history");
    assert_eq!(total, 2);
    assert!(!rows[1].undo);
    assert_eq!(rows[1].changes.len(), 2);
    assert_eq!(rows[1].changes[0].obj_handle, "H2");
    assert_eq!(rows[1].changes[0].trans_type, 2);
}

#[test]
fn older_transaction_is_reverted_and_later_ones_survive() {
    let mut engine = memory_engine();
    let first = add_people(&mut engine, "First", &[("H1", "Ada")]);
    add_people(&mut engine, "Second", &[("H2", "Grace")]);

    engine
        .undo_transaction(first.transaction_id, false)
        .expect("undo first");
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H1")));
    assert!(engine.database().contains(ObjectClass::Person, &handle("H2")));

    // The revert is itself undoable.
    engine.undo().expect("undo").expect("something to undo");
    assert_eq!(
        engine.database().get(ObjectClass::Person, &handle("H1")),
        Some(person("Ada").as_json())
    );
}

#[test]
fn later_edit_is_reported_and_skipped_without_force() {
    let mut engine = memory_engine();
    let added = add_people(&mut engine, "Add person", &[("H1", "Ada")]);
    rename(&mut engine, "H1", "Ada", "Ada Lovelace");

    let check = engine.check_undo(added.transaction_id).expect("check");
    assert!(!check.can_undo_without_force);
    assert_eq!(check.conflicts.len(), 1);
    let conflict = &check.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::ObjectChanged);
    assert_eq!(conflict.kind.as_str(), "object_changed");
    assert_eq!(conflict.obj_class, "Person");
    assert_eq!(conflict.handle, "H1");
    assert_eq!(conflict.change_index, 0);

    let undo_before = engine.undo_count();
    let report = engine
        .undo_transaction(added.transaction_id, false)
        .expect("undo without force");
    assert_eq!(report.applied, 0);
    assert_eq!(report.skipped, 1);
    assert!(report.transaction.is_none());
    assert_eq!(engine.undo_count(), undo_before);
    assert_eq!(
        engine.database().get(ObjectClass::Person, &handle("H1")),
        Some(person("Ada Lovelace").as_json())
    );

    let report = engine
        .undo_transaction(added.transaction_id, true)
        .expect("undo with force");
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 0);
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H1")));
}

#[test]
fn update_is_checked_against_the_state_it_wrote() {
    let mut engine = memory_engine();
    add_people(&mut engine, "Add person", &[("H1", "Ada")]);
    let edit = rename(&mut engine, "H1", "Ada", "Ada Lovelace");

    let check = engine.check_undo(edit.transaction_id).expect("check");
    assert!(check.can_undo_without_force);

    engine
        .undo_transaction(edit.transaction_id, false)
        .expect("undo edit");
    assert_eq!(
        engine.database().get(ObjectClass::Person, &handle("H1")),
        Some(person("Ada").as_json())
    );
}

#[test]
fn recreated_object_blocks_undoing_its_delete() {
    let mut engine = memory_engine();
    add_people(&mut engine, "Add person", &[("H1", "Ada")]);
    let deleted = commit_one(
        &mut engine,
        "Delete person",
        NewChange::delete(ObjectClass::Person, object("H1"), person("Ada")),
    );
    add_people(&mut engine, "Add again", &[("H1", "Grace")]);

    let check = engine.check_undo(deleted.transaction_id).expect("check");
    assert!(!check.can_undo_without_force);
    assert_eq!(check.conflicts.len(), 1);
    assert_eq!(check.conflicts[0].kind, ConflictKind::ObjectExists);

    let report = engine
        .undo_transaction(deleted.transaction_id, false)
        .expect("undo without force");
    assert_eq!(report.skipped, 1);
    assert_eq!(
        engine.database().get(ObjectClass::Person, &handle("H1")),
        Some(person("Grace").as_json())
    );

    engine.database_mut().take_emitted();
    let report = engine
        .undo_transaction(deleted.transaction_id, true)
        .expect("undo with force");
    assert_eq!(report.applied, 1);
    assert_eq!(
        engine.database().get(ObjectClass::Person, &handle("H1")),
        Some(person("Ada").as_json())
    );
    assert_eq!(engine.database().emitted()[0].name, "person-add");
}

#[test]
fn reference_changes_are_reverted_but_not_checked() {
    let mut engine = memory_engine();
    let reference = ChangeHandle::Reference {
        obj: handle("H1"),
        reference: handle("E1"),
    };
    let mut pending = engine.begin("Link event");
    engine
        .write(
            &mut pending,
            &NewChange::add(ObjectClass::Person, object("H1"), person("Ada")),
        )
        .expect("write person");
    engine
        .write(
            &mut pending,
            &NewChange::add(
                ObjectClass::Reference,
                reference.clone(),
                serde_json::json!(["H1", "Person", "E1", "Event"]).into(),
            ),
        )
        .expect("write reference");
    let linked = engine.commit(pending).expect("commit");

    let check = engine.check_undo(linked.transaction_id).expect("check");
    assert_eq!(check.total_changes, 1);

    engine
        .undo_transaction(linked.transaction_id, false)
        .expect("undo by id");
    assert!(engine.database().reference(&reference).is_none());
    assert!(!engine.database().contains(ObjectClass::Person, &handle("H1")));
}

#[test]
fn unknown_transaction_is_not_found() {
    let mut engine = memory_engine();
    let err = engine.check_undo(42).expect_err("missing");
    assert!(matches!(err, StoreError::UnknownTransaction(42)));
    let err = engine.undo_transaction(42, true).expect_err("missing");
    assert_eq!(err.code(), "NOT_FOUND");
}
