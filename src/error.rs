// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Errors returned when a transaction cannot be accepted.
use std::fmt;
use thiserror::Error;

/// Result type alias using [`TrackerError`].
pub type Result<T> = std::result::Result<T, TrackerError>;

/// A precondition violated by [`ChangeTracker::add`](crate::ChangeTracker::add).
///
/// A failed `add` leaves the tracker exactly as it was. The offending record id is kept in its
/// `Debug` rendering so the error stays independent of the id type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// An add for an id that already has a state.
    #[error("record {id} already has tracked changes and cannot be added again")]
    DuplicateAdd { id: String },

    /// An update or delete for an id whose state is already a delete.
    #[error("record {id} is deleted and cannot be edited further")]
    EditDeleted { id: String },

    /// An update or delete for an untracked id without an original record to diff against.
    #[error("record {id} has no tracked state and no original record was supplied")]
    MissingBaseline { id: String },
}

impl TrackerError {
    pub(crate) fn duplicate_add(id: &impl fmt::Debug) -> Self {
        Self::DuplicateAdd {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn edit_deleted(id: &impl fmt::Debug) -> Self {
        Self::EditDeleted {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn missing_baseline(id: &impl fmt::Debug) -> Self {
        Self::MissingBaseline {
            id: format!("{id:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_record() {
        assert_eq!(
            TrackerError::duplicate_add(&3).to_string(),
            "record 3 already has tracked changes and cannot be added again"
        );
        assert_eq!(
            TrackerError::edit_deleted(&"row-1").to_string(),
            "record \"row-1\" is deleted and cannot be edited further"
        );
        assert_eq!(
            TrackerError::missing_baseline(&9u8),
            TrackerError::MissingBaseline { id: "9".into() }
        );
    }
}
