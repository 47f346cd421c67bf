// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Implementation of the quickcheck::Arbitrary trait for the transaction model, plus random
//! edit scripts that can be replayed against any [`ChangeTracker`].
//!
//! The generators are skewed towards few record ids and few distinct property values, since
//! most interesting reconciliation (reverts, deletes of added records, grouped undo) only
//! happens when edits collide.
use crate::{ChangeTracker, Transaction, TransactionType};
use quickcheck::{Arbitrary, Gen};
use serde_json::{Map, Value, json};

const KEYS: [&str; 3] = ["a", "b", "c"];

impl Arbitrary for TransactionType {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&[
            TransactionType::Add,
            TransactionType::Update,
            TransactionType::Update,
            TransactionType::Update,
            TransactionType::Delete,
        ])
        .expect("non-empty")
    }
}

/// The original record edit scripts use for `id`: every property at `0`.
pub fn baseline(id: u8) -> Value {
    json!({"id": id, "a": 0, "b": 0, "c": 0})
}

fn arbitrary_id(g: &mut Gen) -> u8 {
    *g.choose(&[0, 0, 1, 1, 2, 3]).expect("non-empty")
}

fn arbitrary_props(g: &mut Gen) -> Map<String, Value> {
    let mut props = Map::new();
    for key in KEYS {
        if bool::arbitrary(g) {
            let v = *g.choose(&[0, 0, 1, 2]).expect("non-empty");
            props.insert(key.to_string(), json!(v));
        }
    }
    if props.is_empty() {
        props.insert("a".to_string(), json!(1));
    }
    props
}

/// One step of an [`EditScript`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Adds record `id` with a full value, optionally under `parent`.
    Add {
        id: u8,
        value: Value,
        parent: Option<u8>,
    },
    /// Updates some properties of record `id`, passing its [`baseline`] as original.
    Update { id: u8, value: Value },
    /// Deletes record `id`, passing its [`baseline`] as original.
    Delete { id: u8 },
    Undo,
    Redo,
    BeginPending,
    EndPending { commit: bool },
}

impl Step {
    /// Whether the step submits a transaction.
    pub fn is_edit(&self) -> bool {
        matches!(self, Step::Add { .. } | Step::Update { .. } | Step::Delete { .. })
    }

    /// Runs the step, returning whether a submitted transaction was accepted.
    pub fn run<T>(&self, tracker: &mut T) -> bool
    where
        T: ChangeTracker<u8> + ?Sized,
    {
        match self {
            Step::Add { id, value, parent } => {
                let mut tx = Transaction::add(*id, value.clone());
                tx.parent_id = *parent;
                tracker.add(tx, None).is_ok()
            }
            Step::Update { id, value } => tracker
                .add(Transaction::update(*id, value.clone()), Some(baseline(*id)))
                .is_ok(),
            Step::Delete { id } => tracker
                .add(Transaction::delete(*id, baseline(*id)), Some(baseline(*id)))
                .is_ok(),
            Step::Undo => {
                tracker.undo();
                false
            }
            Step::Redo => {
                tracker.redo();
                false
            }
            Step::BeginPending => {
                tracker.begin_pending();
                false
            }
            Step::EndPending { commit } => {
                tracker.end_pending(*commit);
                false
            }
        }
    }

    /// Generates a step that submits a transaction.
    pub fn arbitrary_edit(g: &mut Gen) -> Self {
        let id = arbitrary_id(g);
        match TransactionType::arbitrary(g) {
            TransactionType::Add => {
                let mut value = arbitrary_props(g);
                value.insert("id".to_string(), json!(id));
                if u8::arbitrary(g) % 4 == 0 {
                    value.insert("children".to_string(), json!([{"id": 100 + id}]));
                }
                let parent = bool::arbitrary(g).then(|| arbitrary_id(g));
                Step::Add {
                    id,
                    value: Value::Object(value),
                    parent,
                }
            }
            TransactionType::Update => Step::Update {
                id,
                value: Value::Object(arbitrary_props(g)),
            },
            TransactionType::Delete => Step::Delete { id },
        }
    }
}

impl Arbitrary for Step {
    fn arbitrary(g: &mut Gen) -> Self {
        match *g
            .choose(&[0u8, 0, 0, 0, 0, 0, 1, 1, 2, 3, 4])
            .expect("non-empty")
        {
            0 => Step::arbitrary_edit(g),
            1 => Step::Undo,
            2 => Step::Redo,
            3 => Step::BeginPending,
            _ => Step::EndPending {
                commit: bool::arbitrary(g),
            },
        }
    }
}

/// A random sequence of edits, undos, redos and pending scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct EditScript(pub Vec<Step>);

impl EditScript {
    /// Runs every step, returning how many transactions were accepted.
    pub fn run<T>(&self, tracker: &mut T) -> usize
    where
        T: ChangeTracker<u8> + ?Sized,
    {
        self.0.iter().filter(|step| step.run(tracker)).count()
    }
}

impl Arbitrary for EditScript {
    fn arbitrary(g: &mut Gen) -> Self {
        Self(Vec::arbitrary(g))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Self))
    }
}

/// A script made only of edits, for use inside a pending scope.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBatch(pub Vec<Step>);

impl EditBatch {
    pub fn run<T>(&self, tracker: &mut T) -> usize
    where
        T: ChangeTracker<u8> + ?Sized,
    {
        self.0.iter().filter(|step| step.run(tracker)).count()
    }
}

impl Arbitrary for EditBatch {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 8 + 1;
        Self((0..len).map(|_| Step::arbitrary_edit(g)).collect())
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(
            self.0
                .shrink()
                .filter(|steps| !steps.is_empty())
                .map(Self),
        )
    }
}
