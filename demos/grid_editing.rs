// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The example simulates an editable grid: the user edits a few cells, adds and removes rows,
//! changes their mind with undo/redo, and finally saves.

use serde_json::json;
use std::error::Error;
use txstage::{ChangeTracker, Transaction, TransactionTracker};

fn main() -> Result<(), Box<dyn Error>> {
    // The rows as loaded from the backend. The tracker never touches them until we commit.
    let mut rows = vec![
        json!({"id": 1, "name": "Alice", "team": "red"}),
        json!({"id": 2, "name": "Bob", "team": "blue"}),
    ];

    let mut tracker = TransactionTracker::new();

    // The first edit of an existing row passes the row as it looked before.
    tracker.add(
        Transaction::update(1, json!({"team": "blue"})),
        Some(rows[0].clone()),
    )?;
    tracker.add(Transaction::add(3, json!({"id": 3, "name": "Carol", "team": "red"})), None)?;
    tracker.add(Transaction::delete(2, rows[1].clone()), Some(rows[1].clone()))?;

    // Undo the delete of Bob, then change our mind again.
    tracker.undo();
    println!("after undo: {} change(s)", tracker.aggregated_changes(false).len());
    tracker.redo();

    // Setting Alice's team back to what it was leaves nothing to save for her.
    tracker.add(Transaction::update(1, json!({"team": "red"})), None)?;
    assert!(tracker.state(&1).is_none());

    // This is what a backend would receive.
    for change in tracker.aggregated_changes(true) {
        println!("{} {}: {}", change.kind, change.id, change.new_value);
    }

    // Saving applies the changes locally and resets the tracker.
    tracker.commit(&mut rows);
    assert_eq!(
        rows,
        vec![
            json!({"id": 1, "name": "Alice", "team": "red"}),
            json!({"id": 3, "name": "Carol", "team": "red"}),
        ]
    );
    assert!(!tracker.can_undo());
    println!("saved rows: {}", serde_json::to_string_pretty(&rows)?);

    Ok(())
}
