// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The state table: one reconciled [`State`] per record id.
//!
//! Every accepted transaction is folded into the existing state for its id according to the
//! following transitions:
//!
//! | existing | incoming        | result                                              |
//! |----------|-----------------|-----------------------------------------------------|
//! | none     | add             | add state holding the new value                     |
//! | none     | update / delete | state of the incoming kind, remembering `record_ref` |
//! | add      | update          | value deep-merged, stays an add                     |
//! | add      | delete          | state removed, the record never existed             |
//! | update   | update          | value deep-merged, stays an update                  |
//! | update   | delete          | becomes a delete holding the last known value       |
//! | delete   | update / delete | rejected                                            |
//! | any      | add             | rejected                                            |
//!
//! After each transition an update state is cleaned: properties equal to the original record
//! are dropped, and a state that no longer changes anything is removed.
use crate::{
    RecordId, State, Transaction, TransactionType, TrackerRandomState, create_map,
    error::{Result, TrackerError},
    value::{self, merge_values, structurally_equal},
};
use serde_json::Value;
use std::{collections::HashMap, fmt};

#[derive(Debug, Clone, PartialEq)]
struct Slot<K> {
    /// Creation order, so output never depends on hash order.
    ordinal: u64,
    state: State<K>,
}

/// Maps record ids to their reconciled state.
#[derive(Clone)]
pub(crate) struct StateTable<K> {
    states: HashMap<K, Slot<K>, TrackerRandomState>,
    next_ordinal: u64,
}

impl<K> Default for StateTable<K> {
    fn default() -> Self {
        Self {
            states: create_map(),
            next_ordinal: 0,
        }
    }
}

impl<K> fmt::Debug for StateTable<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slots: Vec<_> = self.states.iter().collect();
        slots.sort_unstable_by_key(|(_, slot)| slot.ordinal);
        f.debug_map()
            .entries(slots.into_iter().map(|(id, slot)| (id, &slot.state)))
            .finish()
    }
}

/// Checks whether `incoming` may be applied on top of a state of kind `existing`.
///
/// `has_baseline` tells whether the caller can establish an original record for an untracked
/// id, either because one was supplied or because the edit goes into a pending scope.
pub(crate) fn check_transition<K>(
    existing: Option<TransactionType>,
    incoming: &Transaction<K>,
    has_baseline: bool,
) -> Result<()>
where
    K: RecordId,
{
    match (existing, incoming.kind) {
        (Some(_), TransactionType::Add) => Err(TrackerError::duplicate_add(&incoming.id)),
        (Some(TransactionType::Delete), TransactionType::Update | TransactionType::Delete) => {
            Err(TrackerError::edit_deleted(&incoming.id))
        }
        (None, TransactionType::Update | TransactionType::Delete) if !has_baseline => {
            Err(TrackerError::missing_baseline(&incoming.id))
        }
        _ => Ok(()),
    }
}

/// The transaction that recreates `state` when applied with the state's `record_ref`.
pub(crate) fn replay_transaction<K>(id: &K, state: &State<K>) -> Transaction<K>
where
    K: RecordId,
{
    Transaction {
        id: id.clone(),
        kind: state.kind,
        new_value: state.value.clone(),
        parent_id: state.parent_id.clone(),
    }
}

/// The state `id` would have if `pending` were replayed on top of `committed`.
///
/// Returns `None` if the two cancel out, for example a pending delete of a committed add.
pub(crate) fn overlay<K>(id: &K, committed: &State<K>, pending: &State<K>) -> Option<State<K>>
where
    K: RecordId,
{
    let mut table = StateTable::default();
    let layered = table
        .apply(&replay_transaction(id, committed), committed.record_ref.as_ref())
        .and_then(|()| table.apply(&replay_transaction(id, pending), pending.record_ref.as_ref()));
    if let Err(error) = layered {
        tracing::warn!(%error, "pending state does not apply on top of committed state");
        return Some(committed.clone());
    }
    table.remove(id)
}

impl<K> StateTable<K>
where
    K: RecordId,
{
    pub(crate) fn get(&self, id: &K) -> Option<&State<K>> {
        self.states.get(id).map(|slot| &slot.state)
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates states in the order they were created.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &State<K>)> {
        let mut slots: Vec<_> = self.states.iter().collect();
        slots.sort_unstable_by_key(|(_, slot)| slot.ordinal);
        slots.into_iter().map(|(id, slot)| (id, &slot.state))
    }

    /// Removes and returns all states in the order they were created.
    pub(crate) fn drain(&mut self) -> Vec<(K, State<K>)> {
        let mut slots: Vec<_> = self.states.drain().collect();
        slots.sort_unstable_by_key(|(_, slot)| slot.ordinal);
        self.next_ordinal = 0;
        slots.into_iter().map(|(id, slot)| (id, slot.state)).collect()
    }

    pub(crate) fn remove(&mut self, id: &K) -> Option<State<K>> {
        self.states.remove(id).map(|slot| slot.state)
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
        self.next_ordinal = 0;
    }

    /// Folds `transaction` into the state for its id.
    ///
    /// Rejects duplicate adds and edits of deleted records without touching the table. Whether
    /// an untracked update needs a `record_ref` is the caller's policy, see
    /// [`check_transition`].
    pub(crate) fn apply(
        &mut self,
        transaction: &Transaction<K>,
        record_ref: Option<&Value>,
    ) -> Result<()> {
        let id = &transaction.id;
        match self.states.get_mut(id) {
            None => {
                let ordinal = self.next_ordinal;
                self.next_ordinal += 1;
                let parent_id = match transaction.kind {
                    TransactionType::Add => transaction.parent_id.clone(),
                    TransactionType::Update | TransactionType::Delete => None,
                };
                self.states.insert(
                    id.clone(),
                    Slot {
                        ordinal,
                        state: State {
                            value: transaction.new_value.clone(),
                            record_ref: record_ref.cloned(),
                            kind: transaction.kind,
                            parent_id,
                        },
                    },
                );
            }
            Some(slot) => match (slot.state.kind, transaction.kind) {
                (_, TransactionType::Add) => return Err(TrackerError::duplicate_add(id)),
                (TransactionType::Delete, TransactionType::Update | TransactionType::Delete) => {
                    return Err(TrackerError::edit_deleted(id));
                }
                (TransactionType::Add, TransactionType::Delete) => {
                    self.states.remove(id);
                }
                (TransactionType::Add | TransactionType::Update, TransactionType::Update) => {
                    value::merge(&mut slot.state.value, &transaction.new_value);
                }
                (TransactionType::Update, TransactionType::Delete) => {
                    slot.state.kind = TransactionType::Delete;
                    slot.state.value = transaction.new_value.clone();
                }
            },
        }
        tracing::trace!(id = ?id, kind = %transaction.kind, state = ?self.get(id), "reconciled");

        self.clean(id);
        Ok(())
    }

    /// Prunes properties of an update state that match the original record, and drops the
    /// state if nothing is left to change.
    fn clean(&mut self, id: &K) {
        let Some(slot) = self.states.get_mut(id) else {
            return;
        };
        let state = &mut slot.state;
        if state.kind != TransactionType::Update {
            return;
        }
        let Some(record_ref) = &state.record_ref else {
            return;
        };

        let unchanged = match (&mut state.value, record_ref) {
            (Value::Object(delta), Value::Object(original)) => {
                delta.retain(|key, v| {
                    !original
                        .get(key)
                        .is_some_and(|orig| structurally_equal(v, orig))
                });
                delta.is_empty()
            }
            (value, record_ref) => structurally_equal(value, record_ref),
        };
        if unchanged {
            tracing::trace!(id = ?id, "update reverted to original, dropping state");
            self.states.remove(id);
        }
    }

    /// Synthesizes one transaction per state, in creation order.
    ///
    /// With `merge_changes` the new value is the full record (original overlaid with the
    /// changes); without it, only the tracked value.
    pub(crate) fn aggregated_changes(&self, merge_changes: bool) -> Vec<Transaction<K>> {
        self.iter()
            .map(|(id, state)| Transaction {
                id: id.clone(),
                kind: state.kind,
                new_value: if merge_changes {
                    merge_values(state.record_ref.as_ref(), &state.value)
                } else {
                    state.value.clone()
                },
                parent_id: state.parent_id.clone(),
            })
            .collect()
    }
}
