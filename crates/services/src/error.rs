//! Shared error types for the services crate.

use thiserror::Error;

use progress_core::ConfigError;
use progress_core::model::{EventKind, Metric, Role, UserId};
use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("user {user_id} has no {role} progress record")]
    NotFound { user_id: UserId, role: Role },

    #[error("{event} credits the {role} role but names no {role} participant")]
    MissingParticipant { event: EventKind, role: Role },

    /// Concurrent writers kept winning; the event can be delivered again.
    #[error("progress update still conflicting after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("increment of {amount} to {metric} must be finite and non-negative")]
    InvalidIncrement { metric: Metric, amount: f64 },

    #[error("{metric} increment targets user {user_id}, who is not the event's {role}")]
    InvalidMetric {
        user_id: UserId,
        metric: Metric,
        role: Role,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProgressError {
    /// Storage lost a race; another attempt may succeed.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ProgressError::Conflict { .. } | ProgressError::Storage(StorageError::Conflict)
        )
    }

    pub(crate) fn from_storage(user_id: UserId, role: Role, err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ProgressError::NotFound { user_id, role },
            other => ProgressError::Storage(other),
        }
    }
}
