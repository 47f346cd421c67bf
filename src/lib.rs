// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # txstage: staged, undoable edits for collections of JSON records
//!
//! This crate keeps track of edits made to a collection of records without touching the
//! collection itself. A host (an editable grid, a form, a tree view) submits every edit as a
//! [`Transaction`], and the tracker keeps
//!
//! - a **transaction log** of every accepted edit, in order,
//! - a **state table** with one reconciled [`State`] per record, describing the net effect of
//!   all edits to that record, and
//! - an **undo/redo history** of grouped actions.
//!
//! Only when the host decides to do so are the reconciled states applied to the real data with
//! [`ChangeTracker::commit`].
//!
//! ## Reconciliation
//!
//! Edits to the same record fold into each other:
//!
//! - updating an added record keeps it an add with the merged value,
//! - deleting an added record forgets about the record entirely,
//! - updating a record back to its original values forgets about the update, and
//! - a deleted record cannot be edited (or added) again.
//!
//! The first update or delete of a record must come with the record as it looked before (its
//! *original*), so that reverts can be detected and so that [`ChangeTracker::commit`] can find
//! the record again.
//!
//! ```
//! use serde_json::json;
//! use txstage::{ChangeTracker, Transaction, TransactionType, TransactionTracker};
//!
//! let original = json!({"id": 7, "name": "Ada", "age": 36});
//! let mut tracker = TransactionTracker::new();
//!
//! tracker.add(Transaction::update(7, json!({"age": 37})), Some(original.clone()))?;
//! assert_eq!(tracker.state(&7).unwrap().kind, TransactionType::Update);
//!
//! // Back to the original value: nothing left to commit.
//! tracker.add(Transaction::update(7, json!({"age": 36})), None)?;
//! assert!(tracker.state(&7).is_none());
//!
//! // Both edits are still in the history though.
//! tracker.undo();
//! assert_eq!(tracker.aggregated_value(&7, false), Some(json!({"age": 37})));
//! # Ok::<(), txstage::TrackerError>(())
//! ```
//!
//! ## Pending scopes
//!
//! Some edits should undo as one: a paste into many cells, a fill-down, a form that saves
//! several records. Between [`ChangeTracker::begin_pending`] and
//! [`ChangeTracker::end_pending`] edits are staged separately and invisible to
//! [`ChangeTracker::aggregated_changes`]. Committing the scope moves them into the tracker as a
//! single undoable action, while discarding it drops them.
//!
//! ## Trackers
//!
//! - [`TransactionTracker`] tracks a flat collection.
//! - [`HierarchicalTracker`] tracks a tree of records, where children hold a `parent_id`.
//! - [`PassthroughTracker`] is used when tracking is disabled and records (almost) nothing.
//!
//! All three implement [`ChangeTracker`], which is object safe.
//!
//! ## Observing changes
//!
//! See the [`event`] module.

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use ahash::RandomState;
use std::{
    hash::BuildHasher,
    sync::atomic::{AtomicBool, Ordering},
};

// Use a constant seed for hashing to make benchmarks have less variance.
pub(crate) const DETERMINISTIC_HASHER: RandomState = RandomState::with_seeds(48, 1516, 23, 42);

mod error;
pub use error::{Result, TrackerError};
mod transaction;
pub use transaction::{RecordId, State, Transaction, TransactionType, UndoEntry};
pub mod value;
pub mod event;
pub use event::{EventOrigin, ListenerId, StateListener, StateUpdate};
mod tracker;
pub use tracker::{ChangeTracker, TransactionTracker};
mod hierarchical;
pub use hierarchical::HierarchicalTracker;
mod passthrough;
pub use passthrough::PassthroughTracker;

mod history;
mod log;
mod pending;
mod state;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;

static ENABLE_DETERMINISM: AtomicBool = AtomicBool::new(false);

/// Makes all state tables hash deterministically.
///
/// This should only be enabled for testing and benchmarking, as it increases the odds of DoS
/// scenarios.
#[doc(hidden)]
pub fn enable_determinism() {
    ENABLE_DETERMINISM.store(true, Ordering::Release);
}

/// Checks if determinism is enabled.
#[doc(hidden)]
pub fn determinism_enabled() -> bool {
    ENABLE_DETERMINISM.load(Ordering::Acquire)
}

#[inline]
fn make_random_state() -> RandomState {
    if determinism_enabled() {
        DETERMINISTIC_HASHER
    } else {
        RandomState::new()
    }
}

fn create_map<K, V>() -> std::collections::HashMap<K, V, TrackerRandomState> {
    std::collections::HashMap::with_hasher(TrackerRandomState::default())
}

/// The hasher of every state table.
///
/// A thin wrapper around [`ahash::RandomState`] that switches to fixed seeds once
/// [`enable_determinism`] has been called.
#[derive(Clone)]
pub struct TrackerRandomState {
    inner: RandomState,
}

impl Default for TrackerRandomState {
    #[inline]
    fn default() -> Self {
        Self {
            inner: make_random_state(),
        }
    }
}

impl BuildHasher for TrackerRandomState {
    type Hasher = <RandomState as BuildHasher>::Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        self.inner.build_hasher()
    }
}
