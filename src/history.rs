// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Undo and redo stacks of grouped [`UndoEntry`]s.
use crate::{RecordId, UndoEntry};
use smallvec::SmallVec;

/// Entries moved by a single undo or redo.
///
/// Most actions are a single transaction, only a committed pending scope produces larger
/// groups.
pub(crate) type Group<K> = SmallVec<[UndoEntry<K>; 1]>;

#[derive(Debug, Clone)]
pub(crate) struct History<K> {
    undo: Vec<UndoEntry<K>>,
    redo: Vec<UndoEntry<K>>,
}

impl<K> Default for History<K> {
    fn default() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }
}

impl<K> History<K>
where
    K: RecordId,
{
    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// The undo stack, oldest entry first.
    pub(crate) fn entries(&self) -> &[UndoEntry<K>] {
        &self.undo
    }

    pub(crate) fn push(&mut self, entry: UndoEntry<K>) {
        self.undo.push(entry);
    }

    pub(crate) fn clear_redo(&mut self) {
        self.redo.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Moves the most recent action from the undo stack to the redo stack.
    ///
    /// Pops followers (`use_in_undo == false`) until the group leader has been popped. The
    /// returned entries are in pop order, newest first.
    pub(crate) fn undo_group(&mut self) -> Group<K> {
        let mut group = Group::new();
        while let Some(entry) = self.undo.pop() {
            let leader = entry.use_in_undo;
            self.redo.push(entry.clone());
            group.push(entry);
            if leader {
                break;
            }
        }
        group
    }

    /// Moves the most recently undone action back onto the undo stack.
    ///
    /// The returned entries are in their original order, leader first.
    pub(crate) fn redo_group(&mut self) -> Group<K> {
        let mut group = Group::new();
        let Some(leader) = self.redo.pop() else {
            return group;
        };
        self.undo.push(leader.clone());
        group.push(leader);
        while self.redo.last().is_some_and(|entry| !entry.use_in_undo) {
            let Some(follower) = self.redo.pop() else {
                break;
            };
            self.undo.push(follower.clone());
            group.push(follower);
        }
        group
    }

    /// Forgets every entry for `id`.
    ///
    /// When the leader of a group goes, its first remaining follower takes over so the rest of
    /// the group still undoes as one action. The redo stack is dropped entirely.
    pub(crate) fn remove_record(&mut self, id: &K) {
        let mut promote = false;
        self.undo.retain_mut(|entry| {
            if entry.transaction.id == *id {
                promote |= entry.use_in_undo;
                return false;
            }
            if entry.use_in_undo {
                promote = false;
            } else if promote {
                entry.use_in_undo = true;
                promote = false;
            }
            true
        });
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transaction;
    use serde_json::json;

    fn entry(id: u32, use_in_undo: bool) -> UndoEntry<u32> {
        UndoEntry {
            transaction: Transaction::update(id, json!({"x": id})),
            record_ref: Some(json!({"x": 0})),
            use_in_undo,
        }
    }

    fn ids(entries: &[UndoEntry<u32>]) -> Vec<u32> {
        entries.iter().map(|e| e.transaction.id).collect()
    }

    #[test]
    fn groups_undo_and_redo_atomically() {
        let mut history = History::default();
        history.push(entry(1, true));
        history.push(entry(2, true));
        history.push(entry(3, false));
        history.push(entry(4, false));
        history.push(entry(5, true));

        assert_eq!(ids(&history.undo_group()), vec![5]);
        assert_eq!(ids(&history.undo_group()), vec![4, 3, 2]);
        assert_eq!(ids(history.entries()), vec![1]);

        assert_eq!(ids(&history.redo_group()), vec![2, 3, 4]);
        assert_eq!(ids(history.entries()), vec![1, 2, 3, 4]);
        assert_eq!(ids(&history.redo_group()), vec![5]);
        assert!(!history.can_redo());
        assert!(history.redo_group().is_empty());
    }

    #[test]
    fn empty_undo_is_empty_group() {
        let mut history = History::<u32>::default();
        assert!(history.undo_group().is_empty());
        assert!(!history.can_redo());
    }

    #[test]
    fn removing_a_leader_promotes_its_follower() {
        let mut history = History::default();
        history.push(entry(1, true));
        history.push(entry(2, false));
        history.push(entry(3, false));
        history.push(entry(4, true));
        history.push(entry(1, false));
        history.push(entry(9, true));
        history.undo_group();
        assert!(history.can_redo());

        history.remove_record(&1);
        let leaders: Vec<_> = history
            .entries()
            .iter()
            .map(|e| (e.transaction.id, e.use_in_undo))
            .collect();
        assert_eq!(leaders, vec![(2, true), (3, false), (4, true)]);
        assert!(!history.can_redo());
    }
}
