// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use serde_json::{Value, json};
use std::hint::black_box;
use tango_bench::{IntoBenchmarks, benchmark_fn, tango_benchmarks, tango_main};
use txstage::{ChangeTracker, Transaction, TransactionTracker};

fn rows(n: u32) -> Vec<Value> {
    (0..n)
        .map(|id| json!({"id": id, "name": format!("row {id}"), "score": 0}))
        .collect()
}

/// A tracker holding one update for each of `n` rows.
fn edited(n: u32) -> TransactionTracker<u32> {
    let mut tracker = TransactionTracker::new();
    for (id, row) in (0..n).zip(rows(n)) {
        tracker
            .add(Transaction::update(id, json!({"score": id})), Some(row))
            .expect("fresh rows accept updates");
    }
    tracker
}

fn add_benchmarks() -> impl IntoBenchmarks {
    txstage::enable_determinism();

    [
        benchmark_fn("add::update_255", move |b| {
            let data = rows(255);
            b.iter(move || {
                let mut tracker = TransactionTracker::new();
                for (id, row) in (0..255).zip(&data) {
                    let _ = tracker.add(
                        Transaction::update(id, json!({"score": 1})),
                        Some(row.clone()),
                    );
                }
                black_box(tracker)
            })
        }),
        benchmark_fn("add::revert_255", move |b| {
            let data = rows(255);
            b.iter(move || {
                let mut tracker = TransactionTracker::new();
                for (id, row) in (0..255).zip(&data) {
                    let _ = tracker.add(
                        Transaction::update(id, json!({"score": 1})),
                        Some(row.clone()),
                    );
                    let _ = tracker.add(Transaction::update(id, json!({"score": 0})), None);
                }
                black_box(tracker)
            })
        }),
        benchmark_fn("add::pending_255", move |b| {
            let data = rows(255);
            b.iter(move || {
                let mut tracker = TransactionTracker::new();
                tracker.begin_pending();
                for (id, row) in (0..255).zip(&data) {
                    let _ = tracker.add(
                        Transaction::update(id, json!({"score": 1})),
                        Some(row.clone()),
                    );
                }
                tracker.end_pending(true);
                black_box(tracker)
            })
        }),
    ]
}

fn history_benchmarks() -> impl IntoBenchmarks {
    txstage::enable_determinism();

    [
        benchmark_fn("history::undo_redo_255", move |b| {
            b.iter(move || {
                let mut tracker = edited(255);
                tracker.undo();
                tracker.redo();
                black_box(tracker)
            })
        }),
        benchmark_fn("history::aggregated_changes_255", move |b| {
            let tracker = edited(255);
            b.iter(move || black_box(&tracker).aggregated_changes(true))
        }),
        benchmark_fn("history::commit_255", move |b| {
            let data = rows(255);
            b.iter(move || {
                let mut data = data.clone();
                edited(255).commit(&mut data);
                black_box(data)
            })
        }),
    ]
}

tango_benchmarks!(add_benchmarks(), history_benchmarks());
tango_main!();
