use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use voice_core::model::{Metrics, SessionId, SessionRecord, UserId};

use crate::blob::{BlobStore, InMemoryBlobStore};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a session record, before storage assigns its row id.
///
/// This mirrors the domain `SessionRecord` minus `id` so repositories can
/// stamp identity without leaking storage concerns into the domain layer.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub audio_path: Option<String>,
    pub duration_sec: u32,
    pub notes: Option<String>,
    pub metrics: Metrics,
    pub day_streak_after: u32,
    pub credit_points_after: i64,
}

impl NewSessionRecord {
    /// Combine with a storage-assigned id into the domain record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the fields violate a
    /// record-level invariant.
    pub fn into_record(self, id: SessionId) -> Result<SessionRecord, StorageError> {
        SessionRecord::from_persisted(
            id,
            self.user_id,
            self.created_at,
            self.audio_path,
            self.duration_sec,
            self.notes,
            self.metrics,
            self.day_streak_after,
            self.credit_points_after,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Repository contract for session records.
///
/// Records are append-only: there is no update or delete operation.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist one new session record and return it with identity assigned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn insert_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<SessionRecord, StorageError>;

    /// Fetch a user's most recent record, by `created_at` descending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or row-validation failures.
    async fn latest_session(&self, user_id: UserId) -> Result<Option<SessionRecord>, StorageError>;

    /// Fetch up to `limit` records for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or row-validation failures.
    async fn list_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SessionRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    inner: Arc<Mutex<InMemoryState>>,
}

#[derive(Default)]
struct InMemoryState {
    next_id: i64,
    records: Vec<SessionRecord>,
}

impl InMemorySessionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<SessionRecord, StorageError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        state.next_id += 1;
        let stored = record.into_record(SessionId::new(state.next_id))?;
        state.records.push(stored.clone());
        Ok(stored)
    }

    async fn latest_session(&self, user_id: UserId) -> Result<Option<SessionRecord>, StorageError> {
        let state = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.user_id() == user_id)
            .max_by_key(|r| (r.created_at(), r.id()))
            .cloned())
    }

    async fn list_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let state = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<SessionRecord> = state
            .records
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| std::cmp::Reverse((r.created_at(), r.id())));
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

/// Aggregates the session repository and blob store behind trait objects
/// for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use voice_core::analysis::analyze;
    use voice_core::time::fixed_now;

    fn new_record(user_id: UserId, created_at: DateTime<Utc>) -> NewSessionRecord {
        NewSessionRecord {
            user_id,
            created_at,
            audio_path: Some(format!("{user_id}/audio.wav")),
            duration_sec: 60,
            notes: None,
            metrics: analyze(60),
            day_streak_after: 1,
            credit_points_after: 12,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let repo = InMemorySessionRepository::new();
        let user = UserId::random();

        let first = repo.insert_session(new_record(user, fixed_now())).await.unwrap();
        let second = repo
            .insert_session(new_record(user, fixed_now() + Duration::minutes(1)))
            .await
            .unwrap();

        assert!(second.id() > first.id());
    }

    #[tokio::test]
    async fn latest_picks_newest_created_at() {
        let repo = InMemorySessionRepository::new();
        let user = UserId::random();
        let now = fixed_now();

        repo.insert_session(new_record(user, now)).await.unwrap();
        let newest = repo
            .insert_session(new_record(user, now + Duration::days(1)))
            .await
            .unwrap();

        let latest = repo.latest_session(user).await.unwrap().unwrap();
        assert_eq!(latest.id(), newest.id());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_user() {
        let repo = InMemorySessionRepository::new();
        let user = UserId::random();
        let other = UserId::random();
        let now = fixed_now();

        repo.insert_session(new_record(user, now)).await.unwrap();
        repo.insert_session(new_record(user, now + Duration::days(1)))
            .await
            .unwrap();
        repo.insert_session(new_record(other, now + Duration::days(2)))
            .await
            .unwrap();

        let sessions = repo.list_sessions(user, 30).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].created_at() > sessions[1].created_at());
        assert!(sessions.iter().all(|r| r.user_id() == user));
    }

    #[tokio::test]
    async fn empty_user_lists_nothing() {
        let repo = InMemorySessionRepository::new();
        let sessions = repo.list_sessions(UserId::random(), 30).await.unwrap();
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn invalid_record_is_rejected_at_insert() {
        let repo = InMemorySessionRepository::new();
        let mut record = new_record(UserId::random(), fixed_now());
        record.day_streak_after = 0;

        let err = repo.insert_session(record).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
