// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Staging area for edits that are not yet part of the undo history.
//!
//! While a scope is active, a tracker routes every accepted transaction into the scope's own
//! log and state table. Ending the scope either drops them, or hands the reconciled states
//! back to the tracker so they can be replayed as a single undoable action.
use crate::{
    RecordId, State, Transaction,
    error::Result,
    log::TransactionLog,
    state::StateTable,
};
use serde_json::Value;

#[derive(Debug, Clone)]
pub(crate) struct PendingScope<K> {
    active: bool,
    log: TransactionLog<K>,
    states: StateTable<K>,
}

impl<K> Default for PendingScope<K> {
    fn default() -> Self {
        Self {
            active: false,
            log: TransactionLog::default(),
            states: StateTable::default(),
        }
    }
}

impl<K> PendingScope<K>
where
    K: RecordId,
{
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Activates the scope. Beginning an already active scope keeps its staged edits.
    pub(crate) fn begin(&mut self) {
        self.active = true;
    }

    /// The pending state for `id`, if the scope is active.
    pub(crate) fn state(&self, id: &K) -> Option<&State<K>> {
        if self.active { self.states.get(id) } else { None }
    }

    #[cfg(test)]
    pub(crate) fn states(&self) -> &StateTable<K> {
        &self.states
    }

    pub(crate) fn log(&self) -> &TransactionLog<K> {
        &self.log
    }

    pub(crate) fn add(&mut self, transaction: Transaction<K>, record_ref: Option<&Value>) -> Result<()> {
        self.states.apply(&transaction, record_ref)?;
        self.log.push(transaction);
        Ok(())
    }

    /// Deactivates the scope and returns its states in creation order.
    pub(crate) fn finish(&mut self) -> Vec<(K, State<K>)> {
        self.active = false;
        self.log.clear();
        self.states.drain()
    }

    /// Deactivates the scope and drops everything staged in it.
    pub(crate) fn discard(&mut self) {
        self.active = false;
        self.log.clear();
        self.states.clear();
    }
}
