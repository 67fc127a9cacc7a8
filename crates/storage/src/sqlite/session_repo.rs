use voice_core::model::{SessionId, SessionRecord, UserId};

use super::{SqliteRepository, mapping::map_session_row};
use crate::repository::{NewSessionRecord, SessionRepository, StorageError};

const SESSION_COLUMNS: &str = r"
    id, user_id, created_at, audio_path, duration_sec, notes,
    clarity, pronunciation, articulation, consistency, pitch_control, breath,
    wpm, day_streak_after, credit_points_after
";

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<SessionRecord, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO voice_sessions (
                    user_id, created_at, audio_path, duration_sec, notes,
                    clarity, pronunciation, articulation, consistency,
                    pitch_control, breath, wpm,
                    day_streak_after, credit_points_after
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
        )
        .bind(record.user_id.value().to_string())
        .bind(record.created_at)
        .bind(record.audio_path.clone())
        .bind(i64::from(record.duration_sec))
        .bind(record.notes.clone())
        .bind(i64::from(record.metrics.clarity()))
        .bind(i64::from(record.metrics.pronunciation()))
        .bind(i64::from(record.metrics.articulation()))
        .bind(i64::from(record.metrics.consistency()))
        .bind(i64::from(record.metrics.pitch_control()))
        .bind(i64::from(record.metrics.breath()))
        .bind(i64::from(record.metrics.wpm()))
        .bind(i64::from(record.day_streak_after))
        .bind(record.credit_points_after)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        record.into_record(SessionId::new(res.last_insert_rowid()))
    }

    async fn latest_session(&self, user_id: UserId) -> Result<Option<SessionRecord>, StorageError> {
        let sql = format!(
            r"
                SELECT {SESSION_COLUMNS}
                FROM voice_sessions
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            "
        );
        let row = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn list_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let sql = format!(
            r"
                SELECT {SESSION_COLUMNS}
                FROM voice_sessions
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
            "
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_session_row(row)?);
        }
        Ok(out)
    }
}
