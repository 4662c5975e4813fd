use async_trait::async_trait;
use chrono::{DateTime, Utc};
use progress_core::model::{Metric, MetricSnapshot, ProgressVector, Role, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// The record changed since it was loaded.
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Persisted state of one user-role: progress vector plus the counters that
/// feed it.
///
/// `version` increases on every write and is the unit of isolation for
/// concurrent updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub role: Role,
    pub vector: ProgressVector,
    pub metrics: MetricSnapshot,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// A fresh record for a user who just acquired `role`.
    #[must_use]
    pub fn new(user_id: UserId, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            role,
            vector: ProgressVector::zeroed(),
            metrics: MetricSnapshot::new(),
            version: 0,
            updated_at: now,
        }
    }
}

/// One record's share of an atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWrite {
    pub user_id: UserId,
    pub role: Role,
    /// Version observed at load time; the write fails with `Conflict` if the
    /// stored record has moved on.
    pub expected_version: u64,
    pub vector: ProgressVector,
    /// Counter deltas added to the record's metrics.
    pub increments: Vec<(Metric, f64)>,
}

/// Writes that must land together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitBatch {
    pub writes: Vec<RecordWrite>,
    pub committed_at: DateTime<Utc>,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read side of the user-role progress store.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Create the zeroed record for a user-role if it does not exist yet, and
    /// return the stored record either way.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be created or read.
    async fn ensure_record(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError>;

    /// Fetch a user-role record with its counters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no record for `role`.
    async fn load_record(&self, user_id: UserId, role: Role)
    -> Result<ProgressRecord, StorageError>;

    /// Fetch only the progress vector.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no record for `role`.
    async fn load_vector(&self, user_id: UserId, role: Role) -> Result<ProgressVector, StorageError> {
        Ok(self.load_record(user_id, role).await?.vector)
    }

    /// Fetch a single counter from the record of the role that owns it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owning record does not exist.
    async fn load_metric(&self, user_id: UserId, metric: Metric) -> Result<f64, StorageError> {
        Ok(self.load_record(user_id, metric.role()).await?.metrics.get(metric))
    }
}

/// Write side: versioned, all-or-nothing persistence.
#[async_trait]
pub trait ProgressPersistence: Send + Sync {
    /// Replace one record's vector if it is still at `expected_version`.
    ///
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on a version mismatch and
    /// `StorageError::NotFound` if the record does not exist.
    async fn save_vector(
        &self,
        user_id: UserId,
        role: Role,
        vector: &ProgressVector,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    /// Apply every write in the batch atomically: counter increments and
    /// vectors for all records, or nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if any record moved past its expected
    /// version, `StorageError::NotFound` if one is missing, or other storage
    /// errors. No write in the batch is visible after an error.
    async fn commit(&self, batch: &CommitBatch) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<HashMap<(UserId, Role), ProgressRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version(
    records: &HashMap<(UserId, Role), ProgressRecord>,
    user_id: UserId,
    role: Role,
    expected_version: u64,
) -> Result<(), StorageError> {
    match records.get(&(user_id, role)) {
        None => Err(StorageError::NotFound),
        Some(rec) if rec.version != expected_version => Err(StorageError::Conflict),
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn ensure_record(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .entry((user_id, role))
            .or_insert_with(|| ProgressRecord::new(user_id, role, now))
            .clone())
    }

    async fn load_record(
        &self,
        user_id: UserId,
        role: Role,
    ) -> Result<ProgressRecord, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&(user_id, role))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressPersistence for InMemoryRepository {
    async fn save_vector(
        &self,
        user_id: UserId,
        role: Role,
        vector: &ProgressVector,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        check_version(&guard, user_id, role, expected_version)?;
        let rec = guard
            .get_mut(&(user_id, role))
            .ok_or(StorageError::NotFound)?;
        rec.vector = *vector;
        rec.version += 1;
        rec.updated_at = now;
        Ok(rec.version)
    }

    async fn commit(&self, batch: &CommitBatch) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // validate everything before touching anything
        for write in &batch.writes {
            check_version(&guard, write.user_id, write.role, write.expected_version)?;
        }

        for write in &batch.writes {
            let rec = guard
                .get_mut(&(write.user_id, write.role))
                .ok_or(StorageError::NotFound)?;
            for (metric, amount) in &write.increments {
                rec.metrics.add(*metric, *amount);
            }
            rec.vector = write.vector;
            rec.version += 1;
            rec.updated_at = batch.committed_at;
        }
        Ok(())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Read and write ports behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub records: Arc<dyn ProgressRepository>,
    pub commits: Arc<dyn ProgressPersistence>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let records: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let commits: Arc<dyn ProgressPersistence> = Arc::new(repo);
        Self { records, commits }
    }
}
