//! Streak and credit progression.
//!
//! Each new session advances the user's state from the *immediately
//! preceding* record only; full history is never replayed.

use chrono::{DateTime, Utc};

use crate::model::Metrics;
use crate::time::utc_days_between;

//
// ─── SEED ─────────────────────────────────────────────────────────────────────
//

/// The slice of the previous session record that progression depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionSeed {
    pub created_at: DateTime<Utc>,
    pub credit_points: i64,
}

//
// ─── PROGRESSION ──────────────────────────────────────────────────────────────
//

/// Streak and credit totals as of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    day_streak: u32,
    credit_points: i64,
}

impl Progression {
    #[must_use]
    pub fn day_streak(&self) -> u32 {
        self.day_streak
    }

    #[must_use]
    pub fn credit_points(&self) -> i64 {
        self.credit_points
    }
}

/// Advance streak and credits for a new session.
///
/// Streak policy, by whole UTC calendar days since the previous record:
/// no previous record or a gap of more than one day gives 1, the same day
/// stays at 1, and exactly one day gives a flat 2. The streak never reads
/// or increments the previous record's streak counter.
///
/// Credits accumulate: previous total (0 for a first session) plus
/// [`credit_delta`], floored at zero so a negative delta can never drive
/// the stored total below the column's lower bound.
#[must_use]
pub fn advance(
    previous: Option<&ProgressionSeed>,
    metrics: &Metrics,
    now: DateTime<Utc>,
) -> Progression {
    let day_streak = match previous {
        None => 1,
        Some(seed) => match utc_days_between(seed.created_at, now) {
            0 => 1,
            1 => 2,
            _ => 1,
        },
    };

    let prev_credits = previous.map_or(0, |seed| seed.credit_points);
    let credit_points = (prev_credits + credit_delta(metrics)).max(0);

    Progression {
        day_streak,
        credit_points,
    }
}

/// Credits earned (or lost) by one session's metrics.
///
/// `round(avg_of_six / 5) + round((wpm - 100) / 20)`, where rounding ties
/// go toward positive infinity. The wpm term goes negative below 90 wpm.
#[must_use]
pub fn credit_delta(metrics: &Metrics) -> i64 {
    let quality = round_half_up(metrics.average_score() / 5.0);
    let pace = round_half_up((f64::from(metrics.wpm()) - 100.0) / 20.0);
    quality + pace
}

/// Rounds to the nearest integer with ties toward positive infinity.
#[allow(clippy::cast_possible_truncation)]
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
