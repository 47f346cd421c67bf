// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The data model shared by every tracker: edit intents, reconciled states and undo entries.
use serde_json::Value;
use std::{fmt, hash::Hash};

/// Identifies a record tracked by a [`ChangeTracker`](crate::ChangeTracker).
///
/// Blanket-implemented for every type that satisfies the bounds, so plain integers and strings
/// work out of the box.
pub trait RecordId: Hash + Eq + Clone + fmt::Debug + 'static {}

impl<T> RecordId for T where T: Hash + Eq + Clone + fmt::Debug + 'static {}

/// The kind of an edit, and of the net state it reconciles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Deserialize, ::serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum TransactionType {
    Add,
    Update,
    Delete,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionType::Add => "add",
            TransactionType::Update => "update",
            TransactionType::Delete => "delete",
        })
    }
}

/// An edit intent submitted by the caller.
///
/// Transactions are immutable once accepted by a tracker. `parent_id` is only meaningful for
/// [`HierarchicalTracker`](crate::HierarchicalTracker), where it names the record an added
/// record is nested under.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Deserialize, ::serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct Transaction<K> {
    pub id: K,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: TransactionType,
    pub new_value: Value,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub parent_id: Option<K>,
}

impl<K> Transaction<K> {
    pub fn new(id: K, kind: TransactionType, new_value: Value) -> Self {
        Self {
            id,
            kind,
            new_value,
            parent_id: None,
        }
    }

    /// An edit that introduces a new record with the given full value.
    pub fn add(id: K, new_value: Value) -> Self {
        Self::new(id, TransactionType::Add, new_value)
    }

    /// An edit that changes some properties of an existing record.
    pub fn update(id: K, new_value: Value) -> Self {
        Self::new(id, TransactionType::Update, new_value)
    }

    /// An edit that removes an existing record; `last_value` is its last known full value.
    pub fn delete(id: K, last_value: Value) -> Self {
        Self::new(id, TransactionType::Delete, last_value)
    }

    /// Nests the record under `parent_id`.
    pub fn with_parent(mut self, parent_id: K) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// The net effect of every accepted transaction for a single record id.
///
/// For [`TransactionType::Update`] states `value` only holds the properties that differ from
/// `record_ref`; for [`TransactionType::Add`] it holds the full record, and for
/// [`TransactionType::Delete`] the last known value of the record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Deserialize, ::serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct State<K> {
    pub value: Value,
    /// Snapshot of the record before any tracked edit, as supplied with the first update or
    /// delete. Used to prune no-op edits and to locate the record on commit.
    pub record_ref: Option<Value>,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: TransactionType,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub parent_id: Option<K>,
}

/// One step of the undo history.
///
/// An entry with `use_in_undo == true` starts a user-visible action. Entries with
/// `use_in_undo == false` belong to the closest preceding leader, so that a single
/// [`undo`](crate::ChangeTracker::undo) reverts the whole group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Deserialize, ::serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct UndoEntry<K> {
    pub transaction: Transaction<K>,
    pub record_ref: Option<Value>,
    pub use_in_undo: bool,
}
