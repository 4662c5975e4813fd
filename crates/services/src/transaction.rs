//! One attempt at applying an event: LOADED, then PROJECTED, then persisted.
//!
//! Each state is its own type, so a batch can only be committed after every
//! credited vector was projected and ratcheted.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use progress_core::model::{EventKind, Metric, ProgressEvent, ProgressVector, Role, UserId};
use progress_core::{EngineConfig, detect_completions};
use storage::repository::{
    CommitBatch, ProgressPersistence, ProgressRecord, ProgressRepository, RecordWrite,
};

use crate::error::ProgressError;

pub(crate) trait TxState: private::Sealed {}

/// Records and counters fetched, nothing computed yet.
pub(crate) struct Loaded;
impl TxState for Loaded {}

/// Final vectors computed, ready to commit.
pub(crate) struct Projected;
impl TxState for Projected {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Loaded {}
    impl Sealed for super::Projected {}
}

/// A user-role record the event reads or writes.
struct Touched {
    record: ProgressRecord,
    /// The routing table credits this role for the event.
    credited: bool,
    increments: Vec<(Metric, f64)>,
    next: ProgressVector,
}

pub(crate) struct UpdateTransaction<'a, S: TxState> {
    config: &'a EngineConfig,
    event: EventKind,
    touched: BTreeMap<Role, Touched>,
    _state: PhantomData<S>,
}

/// Reject increments that are not finite and non-negative, or that target a
/// user who is not the event's participant for the metric's role.
pub(crate) fn validate(event: &ProgressEvent) -> Result<(), ProgressError> {
    for inc in &event.increments {
        if !inc.is_valid() {
            return Err(ProgressError::InvalidIncrement {
                metric: inc.metric,
                amount: inc.amount,
            });
        }
        let role = inc.metric.role();
        if event.participants.get(role) != Some(inc.user_id) {
            return Err(ProgressError::InvalidMetric {
                user_id: inc.user_id,
                metric: inc.metric,
                role,
            });
        }
    }
    Ok(())
}

/// Component-wise maximum of `before` and `projected`, logging any slot the
/// projection tried to lower.
pub(crate) fn ratchet(
    user_id: UserId,
    role: Role,
    before: &ProgressVector,
    projected: &ProgressVector,
) -> ProgressVector {
    let regressed = before.regressions(projected);
    if !regressed.is_empty() {
        tracing::warn!(
            user_id = %user_id,
            role = %role,
            slots = ?regressed,
            "suppressed progress regression"
        );
    }
    before.ratchet(projected)
}

impl<'a> UpdateTransaction<'a, Loaded> {
    /// Fetch every record the event credits or carries increments for.
    ///
    /// # Errors
    ///
    /// `MissingParticipant` when a credited role has no participant,
    /// `NotFound` when a participant has no record for the role, or any
    /// other storage failure.
    pub(crate) async fn load(
        config: &'a EngineConfig,
        event: &ProgressEvent,
        records: &dyn ProgressRepository,
    ) -> Result<Self, ProgressError> {
        let mut targets: BTreeMap<Role, (UserId, bool)> = BTreeMap::new();
        for role in config.routes().roles_for(event.kind) {
            let user_id = event
                .participants
                .get(role)
                .ok_or(ProgressError::MissingParticipant {
                    event: event.kind,
                    role,
                })?;
            targets.insert(role, (user_id, true));
        }
        for inc in &event.increments {
            targets
                .entry(inc.metric.role())
                .or_insert((inc.user_id, false));
        }

        let mut touched = BTreeMap::new();
        for (role, (user_id, credited)) in targets {
            let record = records
                .load_record(user_id, role)
                .await
                .map_err(|e| ProgressError::from_storage(user_id, role, e))?;
            let increments = event
                .increments
                .iter()
                .filter(|inc| inc.metric.role() == role)
                .map(|inc| (inc.metric, inc.amount))
                .collect();
            touched.insert(
                role,
                Touched {
                    next: record.vector,
                    record,
                    credited,
                    increments,
                },
            );
        }

        Ok(Self {
            config,
            event: event.kind,
            touched,
            _state: PhantomData,
        })
    }

    /// Project post-increment counters through the event's rules for every
    /// credited role, then ratchet against the loaded vector.
    pub(crate) fn project(self) -> UpdateTransaction<'a, Projected> {
        let mut touched = self.touched;
        for (role, entry) in &mut touched {
            if !entry.credited {
                continue;
            }
            let mut metrics = entry.record.metrics.clone();
            for (metric, amount) in &entry.increments {
                metrics.add(*metric, *amount);
            }
            let projected =
                self.config
                    .routes()
                    .project_event(self.event, *role, &metrics, &entry.record.vector);
            entry.next = ratchet(entry.record.user_id, *role, &entry.record.vector, &projected);
        }

        UpdateTransaction {
            config: self.config,
            event: self.event,
            touched,
            _state: PhantomData,
        }
    }
}

impl UpdateTransaction<'_, Projected> {
    /// Newly completed titles per credited role; roles with nothing new map
    /// to an empty list.
    pub(crate) fn completions(&self) -> BTreeMap<Role, Vec<String>> {
        self.touched
            .iter()
            .filter(|(_, entry)| entry.credited)
            .map(|(role, entry)| {
                (
                    *role,
                    detect_completions(
                        &entry.record.vector,
                        &entry.next,
                        *role,
                        self.config.catalog(),
                    ),
                )
            })
            .collect()
    }

    pub(crate) fn batch(&self, now: DateTime<Utc>) -> CommitBatch {
        let writes = self
            .touched
            .iter()
            .map(|(role, entry)| RecordWrite {
                user_id: entry.record.user_id,
                role: *role,
                expected_version: entry.record.version,
                vector: entry.next,
                increments: entry.increments.clone(),
            })
            .collect();
        CommitBatch {
            writes,
            committed_at: now,
        }
    }

    /// Commit every touched record in one batch and hand back the
    /// completions. Nothing is written if the commit fails.
    ///
    /// # Errors
    ///
    /// Propagates the storage error, including `Conflict` for the caller's
    /// retry loop.
    pub(crate) async fn persist(
        self,
        commits: &dyn ProgressPersistence,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Role, Vec<String>>, ProgressError> {
        let completions = self.completions();
        commits.commit(&self.batch(now)).await?;
        Ok(completions)
    }
}
