// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The ordered log of accepted transactions.
use crate::{RecordId, Transaction};

/// Append-only, insertion-ordered list of accepted transactions.
///
/// The only removals are the ones [`undo`](crate::ChangeTracker::undo) and
/// [`clear_record`](crate::ChangeTracker::clear_record) perform.
#[derive(Debug, Clone)]
pub(crate) struct TransactionLog<K> {
    entries: Vec<Transaction<K>>,
}

impl<K> Default for TransactionLog<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K> TransactionLog<K>
where
    K: RecordId,
{
    pub(crate) fn push(&mut self, transaction: Transaction<K>) {
        self.entries.push(transaction);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Transaction<K>> {
        self.entries.iter()
    }

    /// Copies out all transactions, or only those for `id`, in insertion order.
    pub(crate) fn snapshot(&self, id: Option<&K>) -> Vec<Transaction<K>> {
        self.entries
            .iter()
            .filter(|tx| id.is_none_or(|id| tx.id == *id))
            .cloned()
            .collect()
    }

    /// Removes the most recent occurrence of `transaction`.
    ///
    /// Returns false if it is not in the log.
    pub(crate) fn remove_last(&mut self, transaction: &Transaction<K>) -> bool {
        match self.entries.iter().rposition(|tx| tx == transaction) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drops every transaction for `id`.
    pub(crate) fn remove_record(&mut self, id: &K) {
        self.entries.retain(|tx| tx.id != *id);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
