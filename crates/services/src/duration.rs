use std::io::Cursor;
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodingError;

/// Best-effort duration estimation for an uploaded artifact.
pub trait DurationEstimator: Send + Sync {
    /// Estimated playback length in whole seconds, at least 1.
    ///
    /// # Errors
    ///
    /// Returns `DecodingError` when the bytes cannot be probed or carry no
    /// duration information. Callers treat this as recoverable.
    fn estimate(&self, file_name: &str, bytes: &[u8]) -> Result<u32, DecodingError>;
}

/// Estimator that probes the container with symphonia and derives the
/// duration from the track's frame count and sample rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaEstimator;

impl SymphoniaEstimator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DurationEstimator for SymphoniaEstimator {
    fn estimate(&self, file_name: &str, bytes: &[u8]) -> Result<u32, DecodingError> {
        let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodingError::Unsupported(e.to_string()))?;

        let format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodingError::NoAudioTrack)?;

        let params = &track.codec_params;
        let sample_rate = params.sample_rate.ok_or(DecodingError::UnknownDuration)?;
        let frames = params.n_frames.ok_or(DecodingError::UnknownDuration)?;

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let seconds = (frames as f64 / f64::from(sample_rate)).round().max(1.0) as u32;
        Ok(seconds)
    }
}

/// Estimator returning a fixed value, for tests and prototyping.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurationEstimator(pub u32);

impl DurationEstimator for FixedDurationEstimator {
    fn estimate(&self, _file_name: &str, _bytes: &[u8]) -> Result<u32, DecodingError> {
        Ok(self.0)
    }
}
