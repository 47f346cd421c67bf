// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The example pastes a block of values into a grid. Every pasted cell is its own edit, but
//! the whole paste is undone in one step.

use serde_json::json;
use std::error::Error;
use txstage::{ChangeTracker, StateUpdate, Transaction, TransactionTracker};

fn main() -> Result<(), Box<dyn Error>> {
    let rows: Vec<_> = (1..=4u32)
        .map(|id| json!({"id": id, "score": 0}))
        .collect();

    let mut tracker = TransactionTracker::new();
    tracker.subscribe(Box::new(|update: &StateUpdate<u32>| {
        println!("{:?}: {} action(s)", update.origin, update.actions.len());
    }));

    // A single edit before the paste.
    tracker.add(
        Transaction::update(1, json!({"score": 5})),
        Some(rows[0].clone()),
    )?;

    // Edits inside a pending scope are staged separately and raise no notifications.
    tracker.begin_pending();
    for (row, score) in rows.iter().zip([10, 20, 30, 40]) {
        let id = row["id"].as_u64().ok_or("row without id")? as u32;
        tracker.add(Transaction::update(id, json!({"score": score})), Some(row.clone()))?;
    }
    // The pending value is visible while the scope is open.
    assert_eq!(tracker.aggregated_value(&1, true), Some(json!({"id": 1, "score": 10})));

    // Committing the scope turns all four cells into one undoable action.
    tracker.end_pending(true);
    println!("changes after paste: {}", tracker.aggregated_changes(false).len());

    tracker.undo();
    // Only the edit from before the paste is left.
    assert_eq!(tracker.aggregated_value(&1, false), Some(json!({"score": 5})));
    assert!(tracker.state(&2).is_none());

    tracker.redo();
    assert_eq!(tracker.aggregated_value(&4, false), Some(json!({"score": 40})));

    Ok(())
}
