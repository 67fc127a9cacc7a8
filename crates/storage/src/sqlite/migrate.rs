use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the session table with its range constraints and the per-user
/// ordering index.
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

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS voice_sessions (
                    id INTEGER PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    audio_path TEXT,
                    duration_sec INTEGER NOT NULL CHECK (duration_sec >= 1),
                    notes TEXT,
                    clarity INTEGER NOT NULL CHECK (clarity BETWEEN 0 AND 100),
                    pronunciation INTEGER NOT NULL CHECK (pronunciation BETWEEN 0 AND 100),
                    articulation INTEGER NOT NULL CHECK (articulation BETWEEN 0 AND 100),
                    consistency INTEGER NOT NULL CHECK (consistency BETWEEN 0 AND 100),
                    pitch_control INTEGER NOT NULL CHECK (pitch_control BETWEEN 0 AND 100),
                    breath INTEGER NOT NULL CHECK (breath BETWEEN 0 AND 100),
                    wpm INTEGER NOT NULL CHECK (wpm BETWEEN 80 AND 180),
                    day_streak_after INTEGER NOT NULL CHECK (day_streak_after >= 1),
                    credit_points_after INTEGER NOT NULL CHECK (credit_points_after >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_voice_sessions_user_created
                    ON voice_sessions (user_id, created_at);
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
    }

    Ok(())
}
