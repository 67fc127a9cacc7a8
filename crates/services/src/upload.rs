use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use storage::blob::{BlobError, BlobStore};
use storage::repository::{NewSessionRecord, SessionRepository, StorageError};
use voice_core::Clock;
use voice_core::analysis::analyze;
use voice_core::model::{SessionRecord, UserId};
use voice_core::progression::advance;

use crate::duration::DurationEstimator;
use crate::error::UploadError;
use crate::identity::IdentityProvider;
use crate::retry::with_backoff;

/// Fallback duration when the artifact cannot be decoded.
pub const DEFAULT_DURATION_SEC: u32 = 60;

/// One audio upload as submitted by the caller.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub notes: Option<String>,
}

/// Orchestrates the upload pipeline: store the artifact, derive metrics,
/// advance progression, persist one session record.
///
/// Same-user calls are serialized on a per-user lock so two concurrent
/// uploads cannot both seed progression from the same previous record.
/// The whole operation is treated as non-cancelable once the artifact
/// write has started.
#[derive(Clone)]
pub struct UploadService {
    clock: Clock,
    identity: Arc<dyn IdentityProvider>,
    blobs: Arc<dyn BlobStore>,
    sessions: Arc<dyn SessionRepository>,
    estimator: Arc<dyn DurationEstimator>,
    user_locks: Arc<Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl UploadService {
    #[must_use]
    pub fn new(
        clock: Clock,
        identity: Arc<dyn IdentityProvider>,
        blobs: Arc<dyn BlobStore>,
        sessions: Arc<dyn SessionRepository>,
        estimator: Arc<dyn DurationEstimator>,
    ) -> Self {
        Self {
            clock,
            identity,
            blobs,
            sessions,
            estimator,
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_for(&self, user_id: UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(locks.entry(user_id).or_default())
    }

    /// Run the full pipeline for one upload and return the stored record.
    ///
    /// A failed duration estimate is recovered with
    /// [`DEFAULT_DURATION_SEC`]; every other failure aborts. A
    /// persistence failure after the artifact write leaves the artifact
    /// in storage rather than risking silent loss.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Authentication` when nobody is signed in,
    /// `UploadError::Storage` when the artifact write fails, and
    /// `UploadError::Persistence` when the record insert fails.
    pub async fn process_upload(
        &self,
        request: UploadRequest,
    ) -> Result<SessionRecord, UploadError> {
        let user_id = self.identity.current_user().await?;

        let user_lock = self.lock_for(user_id);
        let _serialized = user_lock.lock().await;

        let now = self.clock.now();
        let audio_path = artifact_key(user_id, &request.file_name, now);

        with_backoff("artifact write", blob_transient, || {
            self.blobs.put(&audio_path, &request.bytes)
        })
        .await?;

        let duration_sec = match self.estimator.estimate(&request.file_name, &request.bytes) {
            Ok(seconds) => seconds,
            Err(err) => {
                warn!(%err, %audio_path, "duration estimation failed; using default");
                DEFAULT_DURATION_SEC
            }
        };

        let metrics = analyze(duration_sec);

        let previous = with_backoff("previous session read", storage_transient, || {
            self.sessions.latest_session(user_id)
        })
        .await
        .map_err(UploadError::Persistence)?;

        let seed = previous.map(|record| record.progression_seed());
        let progression = advance(seed.as_ref(), &metrics, now);

        let record = NewSessionRecord {
            user_id,
            created_at: now,
            audio_path: Some(audio_path),
            duration_sec,
            notes: request.notes,
            metrics,
            day_streak_after: progression.day_streak(),
            credit_points_after: progression.credit_points(),
        };

        let stored = with_backoff("session insert", storage_transient, || {
            self.sessions.insert_session(record.clone())
        })
        .await
        .map_err(UploadError::Persistence)?;

        info!(
            user = %user_id,
            session = %stored.id(),
            streak = stored.day_streak_after(),
            credits = stored.credit_points_after(),
            "session recorded"
        );
        Ok(stored)
    }
}

fn blob_transient(err: &BlobError) -> bool {
    matches!(err, BlobError::Io(_))
}

fn storage_transient(err: &StorageError) -> bool {
    matches!(err, StorageError::Connection(_))
}

/// User-scoped, time-qualified artifact key: `<user>/<millis>.<ext>`.
///
/// The extension comes from the uploaded file name, lowercased, `wav`
/// when absent.
fn artifact_key(user_id: UserId, file_name: &str, now: DateTime<Utc>) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map_or_else(|| "wav".to_string(), str::to_lowercase);
    format!("{user_id}/{}.{ext}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_core::time::fixed_now;

    #[test]
    fn artifact_key_is_user_scoped_and_time_qualified() {
        let user = UserId::random();
        let key = artifact_key(user, "Morning Take.MP3", fixed_now());
        assert_eq!(key, format!("{user}/{}.mp3", fixed_now().timestamp_millis()));
    }

    #[test]
    fn artifact_key_defaults_to_wav() {
        let user = UserId::random();
        let key = artifact_key(user, "recording", fixed_now());
        assert!(key.ends_with(".wav"));
    }

    #[test]
    fn user_locks_are_reused_per_user() {
        let service = UploadService::new(
            voice_core::time::fixed_clock(),
            Arc::new(crate::identity::StaticIdentity::signed_out()),
            Arc::new(storage::blob::InMemoryBlobStore::new()),
            Arc::new(storage::repository::InMemorySessionRepository::new()),
            Arc::new(crate::duration::FixedDurationEstimator(60)),
        );

        let user = UserId::random();
        let first = service.lock_for(user);
        let second = service.lock_for(user);
        assert!(Arc::ptr_eq(&first, &second));

        let other = service.lock_for(UserId::random());
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
