use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use progress_core::model::{ProgressEvent, Role, UserId};
use progress_core::{EngineConfig, detect_completions};
use storage::repository::{
    ProgressPersistence, ProgressRecord, ProgressRepository, Storage, StorageError,
};

use crate::Clock;
use crate::config::EngineSettings;
use crate::error::ProgressError;
use crate::transaction::{UpdateTransaction, ratchet, validate};

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// What an applied event unlocked, keyed by credited role.
///
/// Every role the event credits is present, with an empty list when nothing
/// new was completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    pub completions: BTreeMap<Role, Vec<String>>,
}

impl EventOutcome {
    /// Titles completed in `role`; empty if the role was not credited.
    #[must_use]
    pub fn for_role(&self, role: Role) -> &[String] {
        self.completions
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// No role completed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completions.values().all(Vec::is_empty)
    }

    /// JSON body for the caller's notification layer.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One row of a user's achievement page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub slot: usize,
    pub title: String,
    pub description: String,
    pub progress: f64,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Applies platform events to achievement progress and answers progress
/// queries.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    settings: EngineSettings,
    config: Arc<EngineConfig>,
    records: Arc<dyn ProgressRepository>,
    commits: Arc<dyn ProgressPersistence>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        config: Arc<EngineConfig>,
        records: Arc<dyn ProgressRepository>,
        commits: Arc<dyn ProgressPersistence>,
    ) -> Self {
        Self {
            clock: Clock::default(),
            settings: EngineSettings::default(),
            config,
            records,
            commits,
        }
    }

    /// Build from a storage aggregate.
    #[must_use]
    pub fn from_storage(config: Arc<EngineConfig>, storage: &Storage) -> Self {
        Self::new(
            config,
            Arc::clone(&storage.records),
            Arc::clone(&storage.commits),
        )
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply an event: commit its counter increments and the projected
    /// vectors of every credited role as one unit, then report what was
    /// newly completed.
    ///
    /// Lost write races are retried from a fresh load up to
    /// `EngineSettings::max_attempts` times in total.
    ///
    /// # Errors
    ///
    /// - `InvalidIncrement` / `InvalidMetric` for a malformed increment, before
    ///   anything is read.
    /// - `MissingParticipant` when a credited role has no participant.
    /// - `NotFound` when a participant has no record for the role.
    /// - `Conflict` when every attempt lost a race.
    /// - `Storage` for any other persistence failure.
    ///
    /// Nothing is written on error.
    pub async fn apply_event(&self, event: &ProgressEvent) -> Result<EventOutcome, ProgressError> {
        validate(event)?;
        let completions = self
            .retrying(event.kind.as_str(), move || async move {
                let tx = UpdateTransaction::load(&self.config, event, self.records.as_ref())
                    .await?
                    .project();
                tx.persist(self.commits.as_ref(), self.clock.now()).await
            })
            .await?;

        for (role, titles) in &completions {
            if !titles.is_empty() {
                tracing::info!(
                    event = %event.kind,
                    role = %role,
                    user_id = ?event.participants.get(*role),
                    titles = ?titles,
                    "achievements completed"
                );
            }
        }
        Ok(EventOutcome { completions })
    }

    /// Create the zeroed record for a user who just acquired `role`. Calling
    /// it again returns the existing record untouched.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be created.
    pub async fn enroll(&self, user_id: UserId, role: Role) -> Result<ProgressRecord, ProgressError> {
        let record = self
            .records
            .ensure_record(user_id, role, self.clock.now())
            .await?;
        tracing::debug!(user_id = %user_id, role = %role, version = record.version, "enrolled");
        Ok(record)
    }

    /// Every achievement of `role` with the user's progress, in slot order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotFound` if the user has no record for `role`.
    pub async fn achievements(
        &self,
        user_id: UserId,
        role: Role,
    ) -> Result<Vec<AchievementProgress>, ProgressError> {
        let vector = self
            .records
            .load_vector(user_id, role)
            .await
            .map_err(|e| ProgressError::from_storage(user_id, role, e))?;
        Ok(self
            .config
            .catalog()
            .for_role(role)
            .map(|def| AchievementProgress {
                slot: def.slot,
                title: def.title.clone(),
                description: def.description.clone(),
                progress: vector.get(def.slot).unwrap_or(0.0),
            })
            .collect())
    }

    /// Number of completed achievements in `role`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotFound` if the user has no record for `role`.
    pub async fn badges_completed(&self, user_id: UserId, role: Role) -> Result<usize, ProgressError> {
        let vector = self
            .records
            .load_vector(user_id, role)
            .await
            .map_err(|e| ProgressError::from_storage(user_id, role, e))?;
        Ok(vector.completed_count())
    }

    /// Re-project every rule of `role` from the stored counters and save the
    /// result. Picks up tiers added to the routing table after the counters
    /// were earned. Returns the titles this completed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotFound` if the user has no record for `role`,
    /// `Conflict` if every attempt lost a race, or other storage errors.
    pub async fn backfill(&self, user_id: UserId, role: Role) -> Result<Vec<String>, ProgressError> {
        self.retrying("backfill", move || async move {
            let record = self
                .records
                .load_record(user_id, role)
                .await
                .map_err(|e| ProgressError::from_storage(user_id, role, e))?;

            let projected = self
                .config
                .routes()
                .rules_for_role(role)
                .into_iter()
                .fold(record.vector, |acc, rule| rule.apply(&record.metrics, &acc));
            let next = ratchet(user_id, role, &record.vector, &projected);
            if next == record.vector {
                return Ok(Vec::new());
            }

            let titles = detect_completions(&record.vector, &next, role, self.config.catalog());
            self.commits
                .save_vector(user_id, role, &next, record.version, self.clock.now())
                .await
                .map_err(|e| ProgressError::from_storage(user_id, role, e))?;
            Ok(titles)
        })
        .await
    }

    /// Run `attempt` until it stops reporting a storage conflict or the
    /// attempt budget is spent.
    async fn retrying<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, ProgressError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProgressError>>,
    {
        let max_attempts = self.settings.max_attempts();
        let mut made = 1;
        loop {
            match attempt().await {
                Err(ProgressError::Storage(StorageError::Conflict)) if made < max_attempts => {
                    let delay = self.backoff(made);
                    tracing::debug!(
                        operation,
                        attempt = made,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "progress write conflicted, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    made += 1;
                }
                Err(ProgressError::Storage(StorageError::Conflict)) => {
                    tracing::warn!(operation, attempts = made, "progress write kept conflicting");
                    return Err(ProgressError::Conflict { attempts: made });
                }
                other => return other,
            }
        }
    }

    /// Linear backoff with up to one extra step of random jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.settings.retry_backoff();
        let step = u64::try_from(base.as_micros()).unwrap_or(u64::MAX);
        let jitter = if step == 0 {
            0
        } else {
            rand::rng().random_range(0..=step)
        };
        base.saturating_mul(attempt) + Duration::from_micros(jitter)
    }
}
