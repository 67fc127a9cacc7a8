use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound for words-per-minute scores.
pub const WPM_MIN: u16 = 80;
/// Upper bound for words-per-minute scores.
pub const WPM_MAX: u16 = 180;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MetricsError {
    #[error("{field} must be in 0..=100, got {value}")]
    ScoreOutOfRange { field: &'static str, value: u8 },

    #[error("wpm must be in {WPM_MIN}..={WPM_MAX}, got {value}")]
    WpmOutOfRange { value: u16 },
}

/// Coaching scores derived from one practice session.
///
/// The six quality scores are bounded to 0..=100; `wpm` is bounded
/// separately to 80..=180.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    clarity: u8,
    pronunciation: u8,
    articulation: u8,
    consistency: u8,
    pitch_control: u8,
    breath: u8,
    wpm: u16,
}

impl Metrics {
    /// Rehydrate metrics from persisted storage, re-checking every bound.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError` if any score falls outside its range.
    pub fn from_persisted(
        clarity: u8,
        pronunciation: u8,
        articulation: u8,
        consistency: u8,
        pitch_control: u8,
        breath: u8,
        wpm: u16,
    ) -> Result<Self, MetricsError> {
        let scores = [
            ("clarity", clarity),
            ("pronunciation", pronunciation),
            ("articulation", articulation),
            ("consistency", consistency),
            ("pitch_control", pitch_control),
            ("breath", breath),
        ];
        for (field, value) in scores {
            if value > 100 {
                return Err(MetricsError::ScoreOutOfRange { field, value });
            }
        }
        if !(WPM_MIN..=WPM_MAX).contains(&wpm) {
            return Err(MetricsError::WpmOutOfRange { value: wpm });
        }

        Ok(Self {
            clarity,
            pronunciation,
            articulation,
            consistency,
            pitch_control,
            breath,
            wpm,
        })
    }

    /// Construct from values the caller has already clamped into range.
    ///
    /// Only the analysis stage uses this; it clamps before building.
    pub(crate) fn from_clamped(
        clarity: u8,
        pronunciation: u8,
        articulation: u8,
        consistency: u8,
        pitch_control: u8,
        breath: u8,
        wpm: u16,
    ) -> Self {
        Self {
            clarity,
            pronunciation,
            articulation,
            consistency,
            pitch_control,
            breath,
            wpm,
        }
    }

    #[must_use]
    pub fn clarity(&self) -> u8 {
        self.clarity
    }

    #[must_use]
    pub fn pronunciation(&self) -> u8 {
        self.pronunciation
    }

    #[must_use]
    pub fn articulation(&self) -> u8 {
        self.articulation
    }

    #[must_use]
    pub fn consistency(&self) -> u8 {
        self.consistency
    }

    #[must_use]
    pub fn pitch_control(&self) -> u8 {
        self.pitch_control
    }

    #[must_use]
    pub fn breath(&self) -> u8 {
        self.breath
    }

    #[must_use]
    pub fn wpm(&self) -> u16 {
        self.wpm
    }

    /// The six quality scores, in declaration order.
    #[must_use]
    pub fn scores(&self) -> [u8; 6] {
        [
            self.clarity,
            self.pronunciation,
            self.articulation,
            self.consistency,
            self.pitch_control,
            self.breath,
        ]
    }

    /// Mean of the six quality scores (excludes `wpm`).
    #[must_use]
    pub fn average_score(&self) -> f64 {
        let sum: u32 = self.scores().iter().map(|&s| u32::from(s)).sum();
        f64::from(sum) / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_persisted_accepts_bounds() {
        let m = Metrics::from_persisted(0, 100, 50, 50, 50, 50, 80).unwrap();
        assert_eq!(m.clarity(), 0);
        assert_eq!(m.pronunciation(), 100);
        assert_eq!(m.wpm(), 80);
    }

    #[test]
    fn from_persisted_rejects_bad_score() {
        let err = Metrics::from_persisted(50, 101, 50, 50, 50, 50, 120).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::ScoreOutOfRange {
                field: "pronunciation",
                value: 101
            }
        ));
    }

    #[test]
    fn from_persisted_rejects_bad_wpm() {
        let low = Metrics::from_persisted(50, 50, 50, 50, 50, 50, 79).unwrap_err();
        assert!(matches!(low, MetricsError::WpmOutOfRange { value: 79 }));

        let high = Metrics::from_persisted(50, 50, 50, 50, 50, 50, 181).unwrap_err();
        assert!(matches!(high, MetricsError::WpmOutOfRange { value: 181 }));
    }

    #[test]
    fn average_is_mean_of_six() {
        let m = Metrics::from_persisted(80, 80, 80, 80, 80, 80, 120).unwrap();
        assert!((m.average_score() - 80.0).abs() < f64::EPSILON);
    }
}
