//! End-to-end behaviour of the flat tracker: reconciliation, undo/redo, pending scopes and
//! committing into a dataset.

use serde_json::{Value, json};
use txstage::{
    ChangeTracker, EventOrigin, StateUpdate, TrackerError, Transaction, TransactionTracker,
    TransactionType,
};

fn tracker() -> TransactionTracker<u32> {
    TransactionTracker::new()
}

#[test]
fn add_then_delete_leaves_no_state() {
    let mut tracker = tracker();
    tracker.add(Transaction::add(1, json!({"id": 1})), None).unwrap();
    tracker
        .add(Transaction::delete(1, json!({"id": 1})), None)
        .unwrap();

    assert!(tracker.state(&1).is_none());
    assert!(tracker.aggregated_changes(false).is_empty());
    // Both edits are kept in the log.
    assert_eq!(tracker.transaction_log(Some(&1)).len(), 2);
}

#[test]
fn reverting_an_update_removes_the_state() {
    let mut tracker = tracker();
    tracker
        .add(
            Transaction::update(1, json!({"a": 1})),
            Some(json!({"a": 0, "b": 0})),
        )
        .unwrap();
    assert_eq!(tracker.state(&1).unwrap().value, json!({"a": 1}));

    tracker
        .add(Transaction::update(1, json!({"a": 0})), None)
        .unwrap();
    assert!(tracker.state(&1).is_none());
}

#[test]
fn partial_revert_keeps_the_rest() {
    let mut tracker = tracker();
    let original = json!({"id": 1, "a": 0, "b": 0});
    tracker
        .add(Transaction::update(1, json!({"a": 1, "b": 1})), Some(original))
        .unwrap();
    tracker
        .add(Transaction::update(1, json!({"b": 0.0})), None)
        .unwrap();

    // 0.0 and 0 are the same number.
    assert_eq!(tracker.state(&1).unwrap().value, json!({"a": 1}));
    assert_eq!(
        tracker.aggregated_value(&1, true),
        Some(json!({"id": 1, "a": 1, "b": 0}))
    );
}

#[test]
fn large_integer_edits_are_not_mistaken_for_reverts() {
    let original = json!({"id": 1, "big": 9007199254740992u64});
    let mut data = vec![original.clone()];
    let mut tracker = tracker();
    tracker
        .add(
            Transaction::update(1, json!({"big": 9007199254740993u64})),
            Some(original),
        )
        .unwrap();
    assert_eq!(
        tracker.state(&1).unwrap().value,
        json!({"big": 9007199254740993u64})
    );

    tracker.commit(&mut data);
    assert_eq!(data, vec![json!({"id": 1, "big": 9007199254740993u64})]);
}

#[test]
fn update_then_delete_becomes_a_delete() {
    let mut tracker = tracker();
    let original = json!({"id": 1, "a": 0});
    tracker
        .add(Transaction::update(1, json!({"a": 5})), Some(original.clone()))
        .unwrap();
    tracker
        .add(Transaction::delete(1, json!({"id": 1, "a": 5})), None)
        .unwrap();

    let state = tracker.state(&1).unwrap();
    assert_eq!(state.kind, TransactionType::Delete);
    assert_eq!(state.record_ref, Some(original));
}

#[test]
fn conflicting_edits_are_rejected() {
    let mut tracker = tracker();
    tracker.add(Transaction::add(1, json!({"id": 1})), None).unwrap();
    assert_eq!(
        tracker.add(Transaction::add(1, json!({"id": 1})), None),
        Err(TrackerError::DuplicateAdd { id: "1".into() })
    );

    tracker
        .add(Transaction::delete(2, json!({"id": 2})), Some(json!({"id": 2})))
        .unwrap();
    let err = tracker
        .add(Transaction::update(2, json!({"x": 1})), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "record 2 is deleted and cannot be edited further");

    let err = tracker
        .add(Transaction::update(3, json!({"x": 1})), None)
        .unwrap_err();
    assert!(matches!(err, TrackerError::MissingBaseline { .. }));

    assert_eq!(tracker.transaction_log(None).len(), 2);
}

#[test]
fn undo_and_redo_step_through_states() {
    let mut tracker = tracker();
    let original = json!({"id": 1, "x": 0});
    tracker
        .add(Transaction::update(1, json!({"x": 1})), Some(original.clone()))
        .unwrap();
    let before = tracker.state(&1);

    tracker
        .add(Transaction::update(1, json!({"y": 1})), None)
        .unwrap();
    let after = tracker.state(&1);
    assert_ne!(before, after);

    tracker.undo();
    assert_eq!(tracker.state(&1), before);
    assert!(tracker.can_redo());

    tracker.redo();
    assert_eq!(tracker.state(&1), after);
    assert!(!tracker.can_redo());

    tracker.undo();
    tracker.undo();
    assert!(tracker.state(&1).is_none());
    assert!(!tracker.can_undo());
    assert!(tracker.transaction_log(None).is_empty());

    // Nothing left to undo.
    tracker.undo();
    assert!(tracker.can_redo());
}

#[test]
fn pending_batch_undoes_in_one_step() {
    let mut tracker = tracker();
    tracker.begin_pending();
    for id in 1..=3 {
        tracker
            .add(Transaction::add(id, json!({"id": id})), None)
            .unwrap();
    }
    assert!(tracker.aggregated_changes(false).is_empty());
    assert_eq!(tracker.transaction_log(None).len(), 3);
    assert!(!tracker.can_undo());

    tracker.end_pending(true);
    assert_eq!(tracker.aggregated_changes(false).len(), 3);

    tracker.undo();
    assert!(tracker.aggregated_changes(false).is_empty());
    assert!(!tracker.can_undo());

    tracker.redo();
    assert_eq!(
        tracker
            .aggregated_changes(false)
            .iter()
            .map(|change| change.id)
            .collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn discarded_pending_scope_leaves_no_trace() {
    let mut tracker = tracker();
    tracker.add(Transaction::add(9, json!({"id": 9})), None).unwrap();
    tracker.begin_pending();
    tracker
        .add(Transaction::update(9, json!({"x": 1})), None)
        .unwrap();
    assert_eq!(tracker.aggregated_value(&9, false), Some(json!({"id": 9, "x": 1})));

    tracker.end_pending(false);
    assert!(!tracker.is_pending());
    assert_eq!(tracker.aggregated_value(&9, false), Some(json!({"id": 9})));
    assert_eq!(tracker.transaction_log(None).len(), 1);
}

#[test]
fn commit_updates_in_place() {
    let mut data = vec![json!({"id": 1, "x": 0})];
    let mut tracker = tracker();
    tracker
        .add(Transaction::update(1, json!({"x": 1})), Some(data[0].clone()))
        .unwrap();

    tracker.commit(&mut data);
    assert_eq!(data, vec![json!({"id": 1, "x": 1})]);
    assert!(tracker.transaction_log(None).is_empty());
    assert!(tracker.aggregated_changes(true).is_empty());
    assert!(!tracker.can_undo());
}

#[test]
fn commit_appends_adds_and_removes_deletes() {
    let mut data = vec![json!({"id": 1, "x": 0}), json!({"id": 3, "x": 3})];
    let mut tracker = tracker();
    tracker
        .add(Transaction::add(2, json!({"id": 2, "x": 9})), None)
        .unwrap();
    tracker
        .add(Transaction::delete(3, data[1].clone()), Some(data[1].clone()))
        .unwrap();
    // The original of 4 is not in the dataset, so its update is dropped.
    tracker
        .add(Transaction::update(4, json!({"x": 1})), Some(json!({"id": 4})))
        .unwrap();

    tracker.commit(&mut data);
    assert_eq!(
        data,
        vec![json!({"id": 1, "x": 0}), json!({"id": 2, "x": 9})]
    );
}

#[test]
fn commit_record_leaves_other_changes_tracked() {
    let mut data: Vec<Value> = Vec::new();
    let mut tracker = tracker();
    tracker.add(Transaction::add(1, json!({"id": 1})), None).unwrap();
    tracker.add(Transaction::add(2, json!({"id": 2})), None).unwrap();

    tracker.commit_record(&mut data, &2);
    assert_eq!(data, vec![json!({"id": 2})]);
    assert_eq!(tracker.transaction_log(None), vec![Transaction::add(1, json!({"id": 1}))]);
    assert!(tracker.can_undo());
}

#[test]
fn listeners_see_every_change() {
    use std::{cell::RefCell, rc::Rc};

    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut tracker = tracker();
    let sink = Rc::clone(&seen);
    let listener = tracker.subscribe(Box::new(move |update: &StateUpdate<u32>| {
        sink.borrow_mut()
            .push((update.origin, update.actions.len()));
    }));

    tracker.add(Transaction::add(1, json!({"id": 1})), None).unwrap();
    tracker.begin_pending();
    tracker.add(Transaction::add(2, json!({"id": 2})), None).unwrap();
    tracker.add(Transaction::add(3, json!({"id": 3})), None).unwrap();
    tracker.end_pending(true);
    tracker.undo();
    tracker.redo();
    let _ = tracker.add(Transaction::add(1, json!({"id": 1})), None);
    tracker.clear();

    assert_eq!(
        *seen.borrow(),
        vec![
            (EventOrigin::Add, 1),
            (EventOrigin::End, 2),
            (EventOrigin::Undo, 2),
            (EventOrigin::Redo, 2),
            (EventOrigin::Clear, 0),
        ]
    );

    assert!(tracker.unsubscribe(listener));
    tracker.add(Transaction::add(5, json!({"id": 5})), None).unwrap();
    assert_eq!(seen.borrow().len(), 5);
}

#[test]
fn trackers_can_be_chosen_at_runtime() {
    fn pick(enabled: bool) -> Box<dyn ChangeTracker<u32>> {
        if enabled {
            Box::new(TransactionTracker::new())
        } else {
            Box::new(txstage::PassthroughTracker::new())
        }
    }

    for enabled in [true, false] {
        let mut tracker = pick(enabled);
        assert_eq!(tracker.enabled(), enabled);
        tracker.add(Transaction::add(1, json!({"id": 1})), None).unwrap();
        assert_eq!(tracker.can_undo(), enabled);
        assert_eq!(tracker.state(&1).is_some(), enabled);
    }
}

#[cfg(feature = "serde")]
#[test]
fn aggregated_changes_serialize_for_the_backend() {
    let mut tracker = tracker();
    tracker
        .add(Transaction::update(1, json!({"name": "b"})), Some(json!({"id": 1, "name": "a"})))
        .unwrap();
    tracker
        .add(Transaction::add(2, json!({"id": 2, "name": "c"})), None)
        .unwrap();
    tracker
        .add(Transaction::delete(3, json!({"id": 3})), Some(json!({"id": 3})))
        .unwrap();

    insta::assert_snapshot!(
        serde_json::to_string(&tracker.aggregated_changes(true)).unwrap(),
        @r#"[{"id":1,"type":"update","newValue":{"id":1,"name":"b"}},{"id":2,"type":"add","newValue":{"id":2,"name":"c"}},{"id":3,"type":"delete","newValue":{"id":3}}]"#
    );
}
