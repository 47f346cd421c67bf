// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Change tracking for trees of records.
//!
//! A [`HierarchicalTracker`] behaves like a [`TransactionTracker`], except that every added
//! record remembers the `parent_id` it was added under and that aggregated changes never carry
//! child collections inline. Each child is a record of its own with its own transactions, so
//! re-serializing the arrays that hold them would duplicate (or resurrect) them.
//!
//! Trees are expected to keep children in an array property of their parent, see
//! [`HierarchicalTracker::commit_nested`].
use crate::{
    ChangeTracker, RecordId, State, Transaction, TransactionTracker, TransactionType,
    error::Result,
    event::{ListenerId, StateListener},
    value::{self, strip_arrays, structurally_equal},
};
use serde_json::Value;

/// Tracks edits to a tree of records.
///
/// ```
/// use serde_json::json;
/// use txstage::{ChangeTracker, HierarchicalTracker, Transaction};
///
/// let mut tracker = HierarchicalTracker::new();
/// tracker
///     .add(Transaction::add(2, json!({"id": 2, "children": []})).with_parent(1), None)
///     .unwrap();
///
/// let changes = tracker.aggregated_changes(false);
/// assert_eq!(changes[0].parent_id, Some(1));
/// assert_eq!(changes[0].new_value, json!({"id": 2}));
/// ```
#[derive(Debug)]
pub struct HierarchicalTracker<K> {
    inner: TransactionTracker<K>,
}

impl<K> Default for HierarchicalTracker<K> {
    fn default() -> Self {
        Self {
            inner: TransactionTracker::default(),
        }
    }
}

impl<K> HierarchicalTracker<K>
where
    K: RecordId,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every tracked change to a tree of records, then clears.
    ///
    /// Records are found anywhere in the tree by comparing their `primary_key` property with
    /// the record id; children of a record live in an array under `child_key`.
    ///
    /// * An added record goes to the end of its parent's children (the array is created if
    ///   needed), or to the end of `dataset` if it has no parent. It is dropped if its parent
    ///   cannot be found.
    /// * An updated record is merged with its new value. Since new values never carry arrays,
    ///   the record keeps its children.
    /// * A deleted record is removed together with its children.
    pub fn commit_nested(&mut self, dataset: &mut Vec<Value>, primary_key: &str, child_key: &str)
    where
        Value: From<K>,
    {
        let changes = self.aggregated_changes(true);
        tracing::debug!(changes = changes.len(), "commit nested");
        for change in &changes {
            merge_nested(dataset, change, primary_key, child_key);
        }
        self.clear();
    }

    /// Like [`commit_nested`](Self::commit_nested), restricted to the change of `id`.
    pub fn commit_nested_record(
        &mut self,
        dataset: &mut Vec<Value>,
        primary_key: &str,
        child_key: &str,
        id: &K,
    ) where
        Value: From<K>,
    {
        if let Some(change) = self
            .aggregated_changes(true)
            .into_iter()
            .find(|change| change.id == *id)
        {
            merge_nested(dataset, &change, primary_key, child_key);
        }
        self.clear_record(id);
    }
}

/// Index path to the record whose `primary_key` equals `key`, searching depth first.
fn find_path(records: &[Value], key: &Value, primary_key: &str, child_key: &str) -> Option<Vec<usize>> {
    for (index, record) in records.iter().enumerate() {
        if record
            .get(primary_key)
            .is_some_and(|candidate| structurally_equal(candidate, key))
        {
            return Some(vec![index]);
        }
        let Some(Value::Array(children)) = record.get(child_key) else {
            continue;
        };
        if let Some(mut path) = find_path(children, key, primary_key, child_key) {
            path.insert(0, index);
            return Some(path);
        }
    }
    None
}

/// The array reached by following `parents` down through `child_key` arrays.
fn collection_at<'a>(
    records: &'a mut Vec<Value>,
    parents: &[usize],
    child_key: &str,
) -> Option<&'a mut Vec<Value>> {
    let Some((first, rest)) = parents.split_first() else {
        return Some(records);
    };
    match records.get_mut(*first)?.get_mut(child_key)? {
        Value::Array(children) => collection_at(children, rest, child_key),
        _ => None,
    }
}

/// Finds the array holding the record `key` and its index in it.
fn locate<'a>(
    records: &'a mut Vec<Value>,
    key: &Value,
    primary_key: &str,
    child_key: &str,
) -> Option<(&'a mut Vec<Value>, usize)> {
    let path = find_path(records, key, primary_key, child_key)?;
    let (index, parents) = path.split_last()?;
    let collection = collection_at(records, parents, child_key)?;
    Some((collection, *index))
}

fn merge_nested<K>(dataset: &mut Vec<Value>, change: &Transaction<K>, primary_key: &str, child_key: &str)
where
    K: RecordId,
    Value: From<K>,
{
    let key = Value::from(change.id.clone());
    match change.kind {
        TransactionType::Add => {
            let Some(parent_id) = &change.parent_id else {
                dataset.push(change.new_value.clone());
                return;
            };
            let parent_key = Value::from(parent_id.clone());
            let Some((siblings, index)) = locate(dataset, &parent_key, primary_key, child_key)
            else {
                tracing::debug!(id = ?change.id, parent = ?parent_id, "parent not found, skipping add");
                return;
            };
            let Value::Object(parent) = &mut siblings[index] else {
                return;
            };
            let children = parent
                .entry(child_key)
                .or_insert_with(|| Value::Array(Vec::new()));
            match children {
                Value::Array(children) => children.push(change.new_value.clone()),
                other => *other = Value::Array(vec![change.new_value.clone()]),
            }
        }
        TransactionType::Update => {
            if let Some((siblings, index)) = locate(dataset, &key, primary_key, child_key) {
                value::merge(&mut siblings[index], &change.new_value);
            }
        }
        TransactionType::Delete => {
            if let Some((siblings, index)) = locate(dataset, &key, primary_key, child_key) {
                siblings.remove(index);
            }
        }
    }
}

impl<K> ChangeTracker<K> for HierarchicalTracker<K>
where
    K: RecordId,
{
    fn enabled(&self) -> bool {
        self.inner.enabled()
    }

    fn add(&mut self, transaction: Transaction<K>, record_ref: Option<Value>) -> Result<()> {
        self.inner.add(transaction, record_ref)
    }

    fn undo(&mut self) {
        self.inner.undo()
    }

    fn redo(&mut self) {
        self.inner.redo()
    }

    fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    fn transaction_log(&self, id: Option<&K>) -> Vec<Transaction<K>> {
        self.inner.transaction_log(id)
    }

    fn state(&self, id: &K) -> Option<State<K>> {
        self.inner.state(id)
    }

    fn aggregated_changes(&self, merge_changes: bool) -> Vec<Transaction<K>> {
        let mut changes = self.inner.aggregated_changes(merge_changes);
        for change in &mut changes {
            strip_arrays(&mut change.new_value);
        }
        changes
    }

    fn aggregated_value(&self, id: &K, merge_changes: bool) -> Option<Value> {
        self.inner.aggregated_value(id, merge_changes)
    }

    fn begin_pending(&mut self) {
        self.inner.begin_pending()
    }

    fn end_pending(&mut self, commit: bool) {
        self.inner.end_pending(commit)
    }

    fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }

    fn commit(&mut self, dataset: &mut Vec<Value>) {
        self.inner.commit(dataset)
    }

    fn commit_record(&mut self, dataset: &mut Vec<Value>, id: &K) {
        self.inner.commit_record(dataset, id)
    }

    fn clear(&mut self) {
        self.inner.clear()
    }

    fn clear_record(&mut self, id: &K) {
        self.inner.clear_record(id)
    }

    fn subscribe(&mut self, listener: Box<dyn StateListener<K>>) -> ListenerId {
        self.inner.subscribe(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.inner.unsubscribe(id)
    }
}
