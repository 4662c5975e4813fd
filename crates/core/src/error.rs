use thiserror::Error;

use crate::model::{EventKind, Metric, Role};

/// Malformed catalog or routing configuration.
///
/// Raised while building an `EngineConfig`, so a bad table stops the process
/// at startup instead of failing individual requests.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{role} slot {slot} is outside the progress vector")]
    SlotOutOfRange { role: Role, slot: usize },
    #[error("{role} slot {slot} is defined more than once")]
    DuplicateDefinition { role: Role, slot: usize },
    #[error("{role} slot {slot} has an empty title")]
    EmptyTitle { role: Role, slot: usize },
    #[error("rule for {metric} has {goals} goals but {slots} slots")]
    LengthMismatch {
        metric: Metric,
        goals: usize,
        slots: usize,
    },
    #[error("rule for {metric} has no goals")]
    EmptyRule { metric: Metric },
    #[error("rule for {metric} has goal {goal}, goals must be finite and positive")]
    InvalidGoal { metric: Metric, goal: f64 },
    #[error("rule for {metric} names {role} slot {slot}, which has no achievement")]
    UnknownSlot {
        metric: Metric,
        role: Role,
        slot: usize,
    },
    #[error("{event} routes {metric} into the {role} vector, but the metric belongs to {owner}")]
    ForeignMetric {
        event: EventKind,
        metric: Metric,
        role: Role,
        owner: Role,
    },
}
