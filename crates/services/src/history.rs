use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use storage::repository::SessionRepository;
use voice_core::model::{League, SessionRecord};

use crate::error::HistoryError;
use crate::identity::IdentityProvider;

/// Default number of records a history read returns.
pub const DEFAULT_HISTORY_LIMIT: u32 = 30;

/// Chart-ready sample of one session's metrics.
///
/// Presentation-agnostic: no pre-formatted strings, no locale
/// assumptions. The UI formats timestamps as needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub created_at: DateTime<Utc>,
    pub clarity: u8,
    pub pronunciation: u8,
    pub articulation: u8,
    pub consistency: u8,
    pub pitch_control: u8,
    pub breath: u8,
    pub wpm: u16,
}

impl TrendPoint {
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        let metrics = record.metrics();
        Self {
            created_at: record.created_at(),
            clarity: metrics.clarity(),
            pronunciation: metrics.pronunciation(),
            articulation: metrics.articulation(),
            consistency: metrics.consistency(),
            pitch_control: metrics.pitch_control(),
            breath: metrics.breath(),
            wpm: metrics.wpm(),
        }
    }
}

/// League placement derived from the newest record's credit total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueStanding {
    pub league: League,
    pub credit_points: i64,
    pub points_to_next: Option<i64>,
}

impl LeagueStanding {
    #[must_use]
    pub fn for_credits(credit_points: i64) -> Self {
        let league = League::for_credits(credit_points);
        Self {
            league,
            credit_points,
            points_to_next: league.points_to_next(credit_points),
        }
    }
}

/// Read-only session history for the signed-in user.
///
/// Every operation is side-effect free; an empty history is a valid state
/// ("no sessions yet"), never an error.
#[derive(Clone)]
pub struct HistoryService {
    identity: Arc<dyn IdentityProvider>,
    sessions: Arc<dyn SessionRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { identity, sessions }
    }

    /// Up to `limit` session records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` on identity or repository failures.
    pub async fn list_history(&self, limit: u32) -> Result<Vec<SessionRecord>, HistoryError> {
        let user_id = self.identity.current_user().await?;
        Ok(self.sessions.list_sessions(user_id, limit).await?)
    }

    /// The newest session record, if any session was ever recorded.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` on identity or repository failures.
    pub async fn latest_report(&self) -> Result<Option<SessionRecord>, HistoryError> {
        let user_id = self.identity.current_user().await?;
        Ok(self.sessions.latest_session(user_id).await?)
    }

    /// Trend samples over the most recent `limit` sessions, oldest first
    /// so charts read left to right.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` on identity or repository failures.
    pub async fn trend(&self, limit: u32) -> Result<Vec<TrendPoint>, HistoryError> {
        let records = self.list_history(limit).await?;
        Ok(records.iter().rev().map(TrendPoint::from_record).collect())
    }

    /// League standing from the newest record; `None` for a new user.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` on identity or repository failures.
    pub async fn standings(&self) -> Result<Option<LeagueStanding>, HistoryError> {
        let latest = self.latest_report().await?;
        Ok(latest.map(|record| LeagueStanding::for_credits(record.credit_points_after())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storage::repository::{InMemorySessionRepository, NewSessionRecord};
    use voice_core::analysis::analyze;
    use voice_core::model::UserId;
    use voice_core::time::fixed_now;

    use crate::identity::StaticIdentity;

    async fn seeded_service(user: UserId, count: i64) -> HistoryService {
        let repo = InMemorySessionRepository::new();
        for i in 0..count {
            repo.insert_session(NewSessionRecord {
                user_id: user,
                created_at: fixed_now() + Duration::days(i),
                audio_path: None,
                duration_sec: 60 + u32::try_from(i).unwrap(),
                notes: None,
                metrics: analyze(60 + u32::try_from(i).unwrap()),
                day_streak_after: 1,
                credit_points_after: 10 * (i + 1),
            })
            .await
            .unwrap();
        }
        HistoryService::new(Arc::new(StaticIdentity::signed_in(user)), Arc::new(repo))
    }

    #[tokio::test]
    async fn empty_history_is_not_an_error() {
        let service = seeded_service(UserId::random(), 0).await;
        let records = service.list_history(DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert!(records.is_empty());
        assert!(service.latest_report().await.unwrap().is_none());
        assert!(service.standings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let service = seeded_service(UserId::random(), 3).await;
        let first = service.list_history(DEFAULT_HISTORY_LIMIT).await.unwrap();
        let second = service.list_history(DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn history_is_newest_first_but_trend_is_oldest_first() {
        let service = seeded_service(UserId::random(), 4).await;

        let history = service.list_history(DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert!(history.windows(2).all(|w| w[0].created_at() > w[1].created_at()));

        let trend = service.trend(DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert_eq!(trend.len(), 4);
        assert!(trend.windows(2).all(|w| w[0].created_at < w[1].created_at));
        assert_eq!(trend.last().unwrap().created_at, history[0].created_at());
    }

    #[tokio::test]
    async fn limit_truncates_to_most_recent() {
        let service = seeded_service(UserId::random(), 5).await;
        let history = service.list_history(2).await.unwrap();
        assert_eq!(history.len(), 2);

        // The trend window covers the same two newest sessions.
        let trend = service.trend(2).await.unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[1].created_at, history[0].created_at());
    }

    #[tokio::test]
    async fn standings_come_from_the_newest_record() {
        let service = seeded_service(UserId::random(), 3).await;
        let standing = service.standings().await.unwrap().unwrap();
        assert_eq!(standing.credit_points, 30);
        assert_eq!(standing.league, League::Bronze);
        assert_eq!(standing.points_to_next, Some(270));
    }

    #[tokio::test]
    async fn signed_out_reads_fail_with_authentication() {
        let repo = InMemorySessionRepository::new();
        let service =
            HistoryService::new(Arc::new(StaticIdentity::signed_out()), Arc::new(repo));
        let err = service.list_history(DEFAULT_HISTORY_LIMIT).await.unwrap_err();
        assert!(matches!(err, HistoryError::Authentication(_)));
    }
}
