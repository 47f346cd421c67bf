// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The [`ChangeTracker`] capability set and the flat [`TransactionTracker`].
use crate::{
    RecordId, State, Transaction, UndoEntry,
    error::Result,
    event::{EventOrigin, ListenerId, Listeners, StateListener},
    history::History,
    log::TransactionLog,
    pending::PendingScope,
    state::{StateTable, check_transition, overlay, replay_transaction},
    value::{merge_values, structurally_equal},
};
use serde_json::Value;

/// Stages edits against a collection of records without touching the collection itself.
///
/// Implemented by [`TransactionTracker`] for flat collections, by
/// [`HierarchicalTracker`](crate::HierarchicalTracker) for trees of records, and by
/// [`PassthroughTracker`](crate::PassthroughTracker) for hosts that have tracking disabled.
/// The trait is object safe, so a host can pick an implementation at runtime and hold it as
/// `Box<dyn ChangeTracker<K>>`.
pub trait ChangeTracker<K>
where
    K: RecordId,
{
    /// Whether edits are tracked. Hosts apply edits to their data directly when this is false.
    fn enabled(&self) -> bool;

    /// Submits an edit.
    ///
    /// `record_ref` is the record as it looked before any tracked edit. It must be supplied
    /// with the first update or delete of a record, unless a pending scope is active.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`](crate::TrackerError) and leaves the tracker unchanged if the
    /// edit conflicts with the record's current state.
    fn add(&mut self, transaction: Transaction<K>, record_ref: Option<Value>) -> Result<()>;

    /// Reverts the most recent action. Does nothing if there is nothing to undo, or while a
    /// pending scope is active.
    fn undo(&mut self);

    /// Reapplies the most recently undone action. Does nothing if there is nothing to redo, or
    /// while a pending scope is active.
    fn redo(&mut self);

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    /// All accepted transactions, or only those for `id`, in the order they were accepted.
    fn transaction_log(&self, id: Option<&K>) -> Vec<Transaction<K>>;

    /// The reconciled state of `id`.
    ///
    /// While a pending scope is active, this is the state `id` would have if the scope were
    /// committed now.
    fn state(&self, id: &K) -> Option<State<K>>;

    /// One synthesized transaction per tracked record.
    ///
    /// With `merge_changes` the new value is the full record, otherwise only the tracked
    /// changes.
    fn aggregated_changes(&self, merge_changes: bool) -> Vec<Transaction<K>>;

    /// The effective value of `id` with pending changes laid over committed ones.
    ///
    /// With `merge_changes` the changes are also laid over the original record. Returns `None`
    /// if `id` is not tracked.
    fn aggregated_value(&self, id: &K, merge_changes: bool) -> Option<Value>;

    /// Starts staging edits outside of the undo history.
    fn begin_pending(&mut self);

    /// Ends the pending scope, turning its edits into a single undoable action if `commit` is
    /// true and dropping them otherwise.
    fn end_pending(&mut self, commit: bool);

    fn is_pending(&self) -> bool;

    /// Applies every tracked change to `dataset`, then [`clear`](Self::clear)s.
    ///
    /// Records are located by structural equality with their original; changes to records
    /// that can no longer be found are dropped.
    fn commit(&mut self, dataset: &mut Vec<Value>);

    /// Applies the tracked change of `id` to `dataset`, then
    /// [`clear_record`](Self::clear_record)s it.
    fn commit_record(&mut self, dataset: &mut Vec<Value>, id: &K);

    /// Drops every transaction, state and undo/redo entry.
    fn clear(&mut self);

    /// Drops the transactions, state and undo entries of `id`, and the whole redo stack.
    fn clear_record(&mut self, id: &K);

    fn subscribe(&mut self, listener: Box<dyn StateListener<K>>) -> ListenerId;

    /// Returns false if `id` was not subscribed.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;
}

/// Applies a single reconciled state to a flat dataset.
pub(crate) fn apply_to_dataset<K>(dataset: &mut Vec<Value>, state: &State<K>) {
    use crate::TransactionType;

    if state.kind == TransactionType::Add {
        dataset.push(state.value.clone());
        return;
    }
    let Some(record_ref) = &state.record_ref else {
        return;
    };
    let Some(index) = dataset
        .iter()
        .position(|record| structurally_equal(record, record_ref))
    else {
        tracing::debug!(kind = %state.kind, "original record not found, skipping");
        return;
    };
    match state.kind {
        TransactionType::Update => {
            dataset[index] = merge_values(Some(record_ref), &state.value);
        }
        TransactionType::Delete => {
            dataset.remove(index);
        }
        TransactionType::Add => {}
    }
}

/// Tracks edits to a flat collection of records.
///
/// ```
/// use serde_json::json;
/// use txstage::{ChangeTracker, Transaction, TransactionTracker};
///
/// let mut data = vec![json!({"id": 1, "x": 0})];
/// let mut tracker = TransactionTracker::new();
///
/// tracker
///     .add(Transaction::update(1, json!({"x": 1})), Some(data[0].clone()))
///     .unwrap();
/// assert_eq!(tracker.aggregated_value(&1, true), Some(json!({"id": 1, "x": 1})));
///
/// tracker.commit(&mut data);
/// assert_eq!(data, vec![json!({"id": 1, "x": 1})]);
/// assert!(!tracker.can_undo());
/// ```
#[derive(Debug)]
pub struct TransactionTracker<K> {
    log: TransactionLog<K>,
    states: StateTable<K>,
    history: History<K>,
    pending: PendingScope<K>,
    listeners: Listeners<K>,
}

impl<K> Default for TransactionTracker<K> {
    fn default() -> Self {
        Self {
            log: TransactionLog::default(),
            states: StateTable::default(),
            history: History::default(),
            pending: PendingScope::default(),
            listeners: Listeners::default(),
        }
    }
}

impl<K> TransactionTracker<K>
where
    K: RecordId,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the state table from the undo history.
    fn rebuild_states(&mut self) {
        self.states.clear();
        for entry in self.history.entries() {
            if let Err(error) = self
                .states
                .apply(&entry.transaction, entry.record_ref.as_ref())
            {
                tracing::warn!(%error, "skipping history entry that no longer applies");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn states(&self) -> &StateTable<K> {
        &self.states
    }
}

impl<K> ChangeTracker<K> for TransactionTracker<K>
where
    K: RecordId,
{
    fn enabled(&self) -> bool {
        true
    }

    fn add(&mut self, transaction: Transaction<K>, record_ref: Option<Value>) -> Result<()> {
        let pending = self.pending.is_active();
        let existing = self
            .pending
            .state(&transaction.id)
            .or_else(|| self.states.get(&transaction.id))
            .map(|state| state.kind);
        check_transition(existing, &transaction, pending || record_ref.is_some())?;

        tracing::debug!(id = ?transaction.id, kind = %transaction.kind, pending, "adding transaction");
        if pending {
            return self.pending.add(transaction, record_ref.as_ref());
        }

        self.states.apply(&transaction, record_ref.as_ref())?;
        self.log.push(transaction.clone());
        let entry = UndoEntry {
            transaction,
            record_ref,
            use_in_undo: true,
        };
        self.history.push(entry.clone());
        self.history.clear_redo();
        self.listeners.notify(EventOrigin::Add, vec![entry]);
        Ok(())
    }

    fn undo(&mut self) {
        if !self.history.can_undo() {
            return;
        }
        if self.pending.is_active() {
            tracing::debug!("undo ignored while pending");
            return;
        }
        let group = self.history.undo_group();
        for entry in &group {
            self.log.remove_last(&entry.transaction);
        }
        self.rebuild_states();

        tracing::debug!(actions = group.len(), states = self.states.len(), "undo");
        self.listeners
            .notify(EventOrigin::Undo, group.into_vec());
    }

    fn redo(&mut self) {
        if self.pending.is_active() {
            tracing::debug!("redo ignored while pending");
            return;
        }
        let group = self.history.redo_group();
        if group.is_empty() {
            return;
        }
        for entry in &group {
            if let Err(error) = self
                .states
                .apply(&entry.transaction, entry.record_ref.as_ref())
            {
                tracing::warn!(%error, "skipping redo entry that no longer applies");
            }
            self.log.push(entry.transaction.clone());
        }

        tracing::debug!(actions = group.len(), states = self.states.len(), "redo");
        self.listeners
            .notify(EventOrigin::Redo, group.into_vec());
    }

    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn transaction_log(&self, id: Option<&K>) -> Vec<Transaction<K>> {
        let mut transactions = self.log.snapshot(id);
        transactions.extend(self.pending.log().snapshot(id));
        transactions
    }

    fn state(&self, id: &K) -> Option<State<K>> {
        match (self.states.get(id), self.pending.state(id)) {
            (Some(committed), Some(pending)) => overlay(id, committed, pending),
            (committed, pending) => pending.or(committed).cloned(),
        }
    }

    fn aggregated_changes(&self, merge_changes: bool) -> Vec<Transaction<K>> {
        self.states.aggregated_changes(merge_changes)
    }

    fn aggregated_value(&self, id: &K, merge_changes: bool) -> Option<Value> {
        let committed = self.states.get(id);
        let pending = self.pending.state(id);
        let mut value = match (committed, pending) {
            (None, None) => return None,
            (Some(committed), Some(pending)) => {
                merge_values(Some(&committed.value), &pending.value)
            }
            (Some(state), None) | (None, Some(state)) => state.value.clone(),
        };
        if merge_changes {
            let original = match committed {
                Some(committed) => committed.record_ref.as_ref(),
                None => pending.and_then(|pending| pending.record_ref.as_ref()),
            };
            value = merge_values(original, &value);
        }
        Some(value)
    }

    fn begin_pending(&mut self) {
        tracing::debug!("begin pending");
        self.pending.begin();
    }

    fn end_pending(&mut self, commit: bool) {
        if !self.pending.is_active() {
            return;
        }
        if !commit {
            tracing::debug!(discarded = self.pending.log().len(), "end pending");
            self.pending.discard();
            return;
        }

        let mut actions = Vec::new();
        for (id, state) in self.pending.finish() {
            let transaction = replay_transaction(&id, &state);
            if let Err(error) = self
                .states
                .apply(&transaction, state.record_ref.as_ref())
            {
                tracing::warn!(%error, "skipping pending state that no longer applies");
                continue;
            }
            self.log.push(transaction.clone());
            let entry = UndoEntry {
                transaction,
                record_ref: state.record_ref,
                use_in_undo: actions.is_empty(),
            };
            self.history.push(entry.clone());
            actions.push(entry);
        }
        if !actions.is_empty() {
            self.history.clear_redo();
        }

        tracing::debug!(actions = actions.len(), "end pending");
        self.listeners.notify(EventOrigin::End, actions);
    }

    fn is_pending(&self) -> bool {
        self.pending.is_active()
    }

    fn commit(&mut self, dataset: &mut Vec<Value>) {
        tracing::debug!(states = self.states.len(), "commit");
        for (_, state) in self.states.iter() {
            apply_to_dataset(dataset, state);
        }
        self.clear();
    }

    fn commit_record(&mut self, dataset: &mut Vec<Value>, id: &K) {
        if let Some(state) = self.states.get(id) {
            tracing::debug!(id = ?id, "commit record");
            apply_to_dataset(dataset, state);
        }
        self.clear_record(id);
    }

    fn clear(&mut self) {
        self.log.clear();
        self.states.clear();
        self.history.clear();
        self.listeners.notify(EventOrigin::Clear, Vec::new());
    }

    fn clear_record(&mut self, id: &K) {
        self.log.remove_record(id);
        self.states.remove(id);
        self.history.remove_record(id);
        self.listeners.notify(EventOrigin::Clear, Vec::new());
    }

    fn subscribe(&mut self, listener: Box<dyn StateListener<K>>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
