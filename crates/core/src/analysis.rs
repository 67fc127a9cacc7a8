//! Placeholder analysis stage.
//!
//! Derives a full [`Metrics`] set from nothing but the session duration, so
//! the rest of the pipeline (progression, persistence, trends) can run
//! before a real signal-analysis stage exists. Swapping in a real analyzer
//! only has to keep the `duration -> Metrics` contract; the record shape
//! does not change.

use crate::model::Metrics;

/// Derive coaching metrics from a session duration, in seconds.
///
/// Pure and total for any `duration_sec >= 1`. The formula is periodic in
/// the duration (period 20 for the quality scores, period 30 for wpm), so
/// equal durations always produce equal metrics.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn analyze(duration_sec: u32) -> Metrics {
    let base = (60 + i64::from(duration_sec % 20) - 10).clamp(40, 85);
    let score = |v: i64| -> u8 { v.clamp(0, 100) as u8 };

    let wpm = (120 + i64::from(duration_sec % 30) - 15).clamp(80, 180) as u16;

    Metrics::from_clamped(
        score(base + 5),
        score(base + 3),
        score(base + 1),
        score(base),
        score(base - 2),
        score(base - 1),
        wpm,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_always_in_bounds() {
        for duration in [1_u32, 7, 19, 20, 59, 60, 61, 3600, u32::MAX] {
            let m = analyze(duration);
            for s in m.scores() {
                assert!(s <= 100, "score out of range for duration {duration}");
            }
            assert!((80..=180).contains(&m.wpm()));
        }
    }

    #[test]
    fn deterministic_for_equal_durations() {
        assert_eq!(analyze(42), analyze(42));
    }

    #[test]
    fn quality_scores_have_period_twenty() {
        assert_eq!(analyze(79).scores(), analyze(99).scores());
    }

    #[test]
    fn duration_one_matches_expected_values() {
        // base = clamp(60 + 1 - 10, 40, 85) = 51
        let m = analyze(1);
        assert_eq!(m.clarity(), 56);
        assert_eq!(m.pronunciation(), 54);
        assert_eq!(m.articulation(), 52);
        assert_eq!(m.consistency(), 51);
        assert_eq!(m.pitch_control(), 49);
        assert_eq!(m.breath(), 50);
        assert_eq!(m.wpm(), 106);
    }

    #[test]
    fn base_clamps_at_both_ends() {
        // duration % 20 == 0 gives the lowest base (50), % 20 == 19 the highest (69);
        // neither hits the 40/85 clamp, so spread between them stays 19.
        let low = analyze(20);
        let high = analyze(19);
        assert_eq!(i32::from(high.consistency()) - i32::from(low.consistency()), 19);
    }
}
