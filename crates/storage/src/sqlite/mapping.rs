use chrono::{DateTime, Utc};
use progress_core::model::{Metric, MetricSnapshot, Role, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::codec::decode_vector;
use crate::repository::{ProgressRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn user_id_to_i64(id: UserId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("user_id overflow".into()))
}

pub(crate) fn version_to_i64(version: u64) -> Result<i64, StorageError> {
    i64::try_from(version).map_err(|_| StorageError::Serialization("version overflow".into()))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

/// Build a record from its `progress_records` row and the matching
/// `progress_metrics` rows.
pub(crate) fn map_record_row(
    row: &SqliteRow,
    metric_rows: &[SqliteRow],
) -> Result<ProgressRecord, StorageError> {
    let user_id = UserId::new(i64_to_u64("user_id", row.try_get("user_id").map_err(ser)?)?);
    let role: Role = row
        .try_get::<String, _>("role")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let vector = decode_vector(&row.try_get::<String, _>("vector").map_err(ser)?)?;
    let version = i64_to_u64("version", row.try_get("version").map_err(ser)?)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;

    let mut metrics = MetricSnapshot::new();
    for metric_row in metric_rows {
        let metric: Metric = metric_row
            .try_get::<String, _>("metric")
            .map_err(ser)?
            .parse()
            .map_err(ser)?;
        if metric.role() != role {
            return Err(StorageError::Serialization(format!(
                "metric {metric} stored under {role}"
            )));
        }
        metrics.set(metric, metric_row.try_get("value").map_err(ser)?);
    }

    Ok(ProgressRecord {
        user_id,
        role,
        vector,
        metrics,
        version,
        updated_at,
    })
}
