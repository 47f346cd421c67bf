// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The example edits a tree of tasks, where sub-tasks live in the `subtasks` array of their
//! parent, and writes the result back into the tree.

use serde_json::json;
use std::error::Error;
use txstage::{ChangeTracker, HierarchicalTracker, Transaction};

fn main() -> Result<(), Box<dyn Error>> {
    let mut tasks = vec![json!({
        "id": 1,
        "title": "Release",
        "subtasks": [
            {"id": 2, "title": "Changelog", "done": false},
            {"id": 3, "title": "Tag", "done": false}
        ]
    })];

    let mut tracker = HierarchicalTracker::<u64>::new();

    // A new sub-task of the changelog task. Adds remember their parent.
    tracker.add(
        Transaction::add(4, json!({"id": 4, "title": "Collect PRs", "done": true}))
            .with_parent(2),
        None,
    )?;
    tracker.add(
        Transaction::update(2, json!({"done": true})),
        Some(tasks[0]["subtasks"][0].clone()),
    )?;
    tracker.add(
        Transaction::delete(3, tasks[0]["subtasks"][1].clone()),
        Some(tasks[0]["subtasks"][1].clone()),
    )?;

    // Changes never carry the child arrays: each child is tracked on its own.
    for change in tracker.aggregated_changes(true) {
        println!(
            "{} {} (parent {:?}): {}",
            change.kind, change.id, change.parent_id, change.new_value
        );
    }

    tracker.commit_nested(&mut tasks, "id", "subtasks");
    println!("{}", serde_json::to_string_pretty(&tasks)?);
    assert_eq!(
        tasks[0]["subtasks"],
        json!([{
            "id": 2,
            "title": "Changelog",
            "done": true,
            "subtasks": [{"id": 4, "title": "Collect PRs", "done": true}]
        }])
    );

    Ok(())
}
