// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! A [`ChangeTracker`] for hosts that have change tracking turned off.
use crate::{
    ChangeTracker, RecordId, State, Transaction,
    error::Result,
    event::{ListenerId, Listeners, StateListener},
    pending::PendingScope,
    value::merge_values,
};
use serde_json::Value;

/// Records nothing, so the host applies edits to its data directly.
///
/// Pending scopes still work, so that in-progress edits (a cell being typed into, a form being
/// filled) resolve through [`state`](ChangeTracker::state) and
/// [`aggregated_value`](ChangeTracker::aggregated_value). Ending a scope always drops it, and
/// nothing is ever undoable or committed.
///
/// Subscribers are accepted but never notified.
#[derive(Debug)]
pub struct PassthroughTracker<K> {
    pending: PendingScope<K>,
    listeners: Listeners<K>,
}

impl<K> Default for PassthroughTracker<K> {
    fn default() -> Self {
        Self {
            pending: PendingScope::default(),
            listeners: Listeners::default(),
        }
    }
}

impl<K> PassthroughTracker<K>
where
    K: RecordId,
{
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K> ChangeTracker<K> for PassthroughTracker<K>
where
    K: RecordId,
{
    fn enabled(&self) -> bool {
        false
    }

    fn add(&mut self, transaction: Transaction<K>, record_ref: Option<Value>) -> Result<()> {
        if !self.pending.is_active() {
            return Ok(());
        }
        tracing::trace!(id = ?transaction.id, kind = %transaction.kind, "staging while disabled");
        self.pending.add(transaction, record_ref.as_ref())
    }

    fn undo(&mut self) {}

    fn redo(&mut self) {}

    fn can_undo(&self) -> bool {
        false
    }

    fn can_redo(&self) -> bool {
        false
    }

    fn transaction_log(&self, id: Option<&K>) -> Vec<Transaction<K>> {
        self.pending.log().snapshot(id)
    }

    fn state(&self, id: &K) -> Option<State<K>> {
        self.pending.state(id).cloned()
    }

    fn aggregated_changes(&self, _merge_changes: bool) -> Vec<Transaction<K>> {
        Vec::new()
    }

    fn aggregated_value(&self, id: &K, merge_changes: bool) -> Option<Value> {
        let state = self.pending.state(id)?;
        Some(if merge_changes {
            merge_values(state.record_ref.as_ref(), &state.value)
        } else {
            state.value.clone()
        })
    }

    fn begin_pending(&mut self) {
        self.pending.begin();
    }

    fn end_pending(&mut self, _commit: bool) {
        self.pending.discard();
    }

    fn is_pending(&self) -> bool {
        self.pending.is_active()
    }

    fn commit(&mut self, _dataset: &mut Vec<Value>) {}

    fn commit_record(&mut self, _dataset: &mut Vec<Value>, _id: &K) {}

    fn clear(&mut self) {}

    fn clear_record(&mut self, _id: &K) {}

    fn subscribe(&mut self, listener: Box<dyn StateListener<K>>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
