use chrono::{DateTime, Utc};
use progress_core::model::{ProgressVector, Role, UserId};
use sqlx::SqliteConnection;

use super::{
    SqliteRepository,
    mapping::{map_record_row, user_id_to_i64, version_to_i64},
};
use crate::codec::encode_vector;
use crate::repository::{
    CommitBatch, ProgressPersistence, ProgressRecord, ProgressRepository, RecordWrite,
    StorageError,
};

fn conn_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

async fn fetch_record(
    conn: &mut SqliteConnection,
    user_id: UserId,
    role: Role,
) -> Result<Option<ProgressRecord>, StorageError> {
    let user = user_id_to_i64(user_id)?;

    let Some(row) = sqlx::query(
        r"
            SELECT user_id, role, vector, version, updated_at
            FROM progress_records
            WHERE user_id = ?1 AND role = ?2
        ",
    )
    .bind(user)
    .bind(role.as_str())
    .fetch_optional(&mut *conn)
    .await
    .map_err(conn_err)?
    else {
        return Ok(None);
    };

    let metric_rows = sqlx::query(
        r"
            SELECT metric, value
            FROM progress_metrics
            WHERE user_id = ?1 AND role = ?2
            ORDER BY metric ASC
        ",
    )
    .bind(user)
    .bind(role.as_str())
    .fetch_all(&mut *conn)
    .await
    .map_err(conn_err)?;

    map_record_row(&row, &metric_rows).map(Some)
}

/// Versioned vector update. Distinguishes a stale version from a missing row
/// once the guarded update touched nothing.
async fn update_vector(
    conn: &mut SqliteConnection,
    user_id: UserId,
    role: Role,
    vector: &ProgressVector,
    expected_version: u64,
    now: DateTime<Utc>,
) -> Result<u64, StorageError> {
    let user = user_id_to_i64(user_id)?;
    let expected = version_to_i64(expected_version)?;

    let res = sqlx::query(
        r"
            UPDATE progress_records
            SET vector = ?1, version = version + 1, updated_at = ?2
            WHERE user_id = ?3 AND role = ?4 AND version = ?5
        ",
    )
    .bind(encode_vector(vector))
    .bind(now)
    .bind(user)
    .bind(role.as_str())
    .bind(expected)
    .execute(&mut *conn)
    .await
    .map_err(conn_err)?;

    if res.rows_affected() == 0 {
        let exists = sqlx::query("SELECT 1 FROM progress_records WHERE user_id = ?1 AND role = ?2")
            .bind(user)
            .bind(role.as_str())
            .fetch_optional(&mut *conn)
            .await
            .map_err(conn_err)?
            .is_some();
        return Err(if exists {
            StorageError::Conflict
        } else {
            StorageError::NotFound
        });
    }

    Ok(expected_version + 1)
}

async fn apply_write(
    conn: &mut SqliteConnection,
    write: &RecordWrite,
    at: DateTime<Utc>,
) -> Result<(), StorageError> {
    update_vector(
        conn,
        write.user_id,
        write.role,
        &write.vector,
        write.expected_version,
        at,
    )
    .await?;

    let user = user_id_to_i64(write.user_id)?;
    for (metric, amount) in &write.increments {
        if metric.role() != write.role {
            return Err(StorageError::Serialization(format!(
                "metric {metric} does not belong to {}",
                write.role
            )));
        }
        sqlx::query(
            r"
                INSERT INTO progress_metrics (user_id, role, metric, value)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, role, metric) DO UPDATE SET
                    value = progress_metrics.value + excluded.value
            ",
        )
        .bind(user)
        .bind(write.role.as_str())
        .bind(metric.as_str())
        .bind(*amount)
        .execute(&mut *conn)
        .await
        .map_err(conn_err)?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn ensure_record(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let user = user_id_to_i64(user_id)?;
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        let res = sqlx::query(
            r"
                INSERT INTO progress_records (user_id, role, vector, version, updated_at)
                VALUES (?1, ?2, ?3, 0, ?4)
                ON CONFLICT(user_id, role) DO NOTHING
            ",
        )
        .bind(user)
        .bind(role.as_str())
        .bind(encode_vector(&ProgressVector::zeroed()))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        let record = fetch_record(&mut *tx, user_id, role)
            .await?
            .ok_or(StorageError::NotFound)?;
        tx.commit().await.map_err(conn_err)?;

        if res.rows_affected() > 0 {
            tracing::debug!(user = %user_id, %role, "created progress record");
        }
        Ok(record)
    }

    async fn load_record(
        &self,
        user_id: UserId,
        role: Role,
    ) -> Result<ProgressRecord, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        let record = fetch_record(&mut *tx, user_id, role).await?;
        tx.commit().await.map_err(conn_err)?;
        record.ok_or(StorageError::NotFound)
    }
}

#[async_trait::async_trait]
impl ProgressPersistence for SqliteRepository {
    async fn save_vector(
        &self,
        user_id: UserId,
        role: Role,
        vector: &ProgressVector,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        let version = update_vector(&mut *tx, user_id, role, vector, expected_version, now).await?;
        tx.commit().await.map_err(conn_err)?;
        Ok(version)
    }

    async fn commit(&self, batch: &CommitBatch) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        // dropping `tx` on any error rolls back every write in the batch
        for write in &batch.writes {
            apply_write(&mut *tx, write, batch.committed_at).await?;
        }

        tx.commit().await.map_err(conn_err)?;
        tracing::debug!(writes = batch.writes.len(), "committed progress batch");
        Ok(())
    }
}
