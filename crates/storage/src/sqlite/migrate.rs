use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Brings the progress schema up to date.
///
/// Version 1 holds one row per user-role with the encoded vector, plus one row
/// per non-zero counter.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress_records (
                    user_id INTEGER NOT NULL,
                    role TEXT NOT NULL CHECK (role IN ('STUDENT', 'TUTOR')),
                    vector TEXT NOT NULL,
                    version INTEGER NOT NULL CHECK (version >= 0),
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, role)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress_metrics (
                    user_id INTEGER NOT NULL,
                    role TEXT NOT NULL,
                    metric TEXT NOT NULL,
                    value REAL NOT NULL CHECK (value >= 0),
                    PRIMARY KEY (user_id, role, metric),
                    FOREIGN KEY (user_id, role)
                        REFERENCES progress_records(user_id, role) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(version = 1, "applied progress schema migration");
    }

    Ok(())
}
