// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Observe changes to a tracker's state.
//!
//! Every successful [`add`](crate::ChangeTracker::add), [`undo`](crate::ChangeTracker::undo),
//! [`redo`](crate::ChangeTracker::redo), [`clear`](crate::ChangeTracker::clear) and committing
//! [`end_pending`](crate::ChangeTracker::end_pending) produces one [`StateUpdate`], delivered
//! to every subscribed [`StateListener`] after the tracker has finished mutating itself.
//!
//! Hosts typically subscribe once and re-render whatever shows the tracked records. Closures
//! are listeners too:
//!
//! ```
//! use serde_json::json;
//! use txstage::{ChangeTracker, Transaction, TransactionTracker, event::StateUpdate};
//!
//! let mut tracker = TransactionTracker::<u32>::new();
//! tracker.subscribe(Box::new(|update: &StateUpdate<u32>| {
//!     println!("{:?}: {} action(s)", update.origin, update.actions.len());
//! }));
//! tracker.add(Transaction::add(1, json!({"id": 1})), None).unwrap();
//! ```
use crate::UndoEntry;
use std::fmt;

/// What caused a [`StateUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Deserialize, ::serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum EventOrigin {
    Add,
    Undo,
    Redo,
    Clear,
    /// A pending scope was committed.
    End,
}

/// A change to a tracker's state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct StateUpdate<K> {
    pub origin: EventOrigin,
    /// The entries that were applied (add, redo, end) or reverted (undo). Empty for clears.
    pub actions: Vec<UndoEntry<K>>,
}

/// Receives [`StateUpdate`]s from a tracker.
pub trait StateListener<K> {
    fn state_updated(&mut self, update: &StateUpdate<K>);
}

impl<K, F> StateListener<K> for F
where
    F: FnMut(&StateUpdate<K>),
{
    fn state_updated(&mut self, update: &StateUpdate<K>) {
        self(update)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// The subscribers of one tracker.
pub(crate) struct Listeners<K> {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<dyn StateListener<K>>)>,
}

impl<K> Default for Listeners<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}

impl<K> fmt::Debug for Listeners<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|(id, _)| id))
            .finish()
    }
}

impl<K> Listeners<K> {
    pub(crate) fn subscribe(&mut self, listener: Box<dyn StateListener<K>>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub(crate) fn notify(&mut self, origin: EventOrigin, actions: Vec<UndoEntry<K>>) {
        if self.listeners.is_empty() {
            return;
        }
        let update = StateUpdate { origin, actions };
        for (_, listener) in &mut self.listeners {
            listener.state_updated(&update);
        }
    }
}
