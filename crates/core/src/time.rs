use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Whole UTC calendar days from `earlier` to `later`.
///
/// Both instants are truncated to their UTC calendar date before
/// subtracting, so 23:59 and 00:01 on consecutive days are one day apart.
/// Negative when `later` falls on an earlier date.
#[must_use]
pub fn utc_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    later
        .date_naive()
        .signed_duration_since(earlier.date_naive())
        .num_days()
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_calendar_day_is_zero_days() {
        let morning = fixed_now();
        let later = morning + Duration::minutes(5);
        assert_eq!(utc_days_between(morning, later), 0);
    }

    #[test]
    fn midnight_boundary_counts_as_one_day() {
        // 22:13:20Z, so +2h crosses into the next UTC date.
        let evening = fixed_now();
        let past_midnight = evening + Duration::hours(2);
        assert_eq!(utc_days_between(evening, past_midnight), 1);
    }

    #[test]
    fn reversed_order_is_negative() {
        let now = fixed_now();
        assert_eq!(utc_days_between(now + Duration::days(3), now), -3);
    }
}
