use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{Metrics, SessionId, UserId};
use crate::progression::ProgressionSeed;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionRecordError {
    #[error("duration_sec must be at least 1")]
    ZeroDuration,

    #[error("day_streak_after must be at least 1")]
    ZeroStreak,

    #[error("credit_points_after must not be negative, got {got}")]
    NegativeCredits { got: i64 },
}

/// One persisted outcome of a processed audio upload.
///
/// Immutable once written: there is no update path, and the streak/credit
/// fields are derived from the immediately preceding record at creation
/// time, never recomputed from full history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    id: SessionId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    audio_path: Option<String>,
    duration_sec: u32,
    notes: Option<String>,
    #[serde(flatten)]
    metrics: Metrics,
    day_streak_after: u32,
    credit_points_after: i64,
}

impl SessionRecord {
    /// Rehydrate a session record from persisted storage.
    ///
    /// Metrics arrive already validated (`Metrics::from_persisted`); this
    /// checks the remaining record-level invariants.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError` if duration, streak, or credits are out
    /// of range.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        audio_path: Option<String>,
        duration_sec: u32,
        notes: Option<String>,
        metrics: Metrics,
        day_streak_after: u32,
        credit_points_after: i64,
    ) -> Result<Self, SessionRecordError> {
        if duration_sec == 0 {
            return Err(SessionRecordError::ZeroDuration);
        }
        if day_streak_after == 0 {
            return Err(SessionRecordError::ZeroStreak);
        }
        if credit_points_after < 0 {
            return Err(SessionRecordError::NegativeCredits {
                got: credit_points_after,
            });
        }

        Ok(Self {
            id,
            user_id,
            created_at,
            audio_path,
            duration_sec,
            notes,
            metrics,
            day_streak_after,
            credit_points_after,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn audio_path(&self) -> Option<&str> {
        self.audio_path.as_deref()
    }

    #[must_use]
    pub fn duration_sec(&self) -> u32 {
        self.duration_sec
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn day_streak_after(&self) -> u32 {
        self.day_streak_after
    }

    #[must_use]
    pub fn credit_points_after(&self) -> i64 {
        self.credit_points_after
    }

    /// The `(created_at, credits)` pair the next session advances from.
    #[must_use]
    pub fn progression_seed(&self) -> ProgressionSeed {
        ProgressionSeed {
            created_at: self.created_at,
            credit_points: self.credit_points_after,
        }
    }
}
