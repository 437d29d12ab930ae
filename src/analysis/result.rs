//! Spectrogram and artifact result types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SpectrogramError;

/// Mel-scaled log-power spectrogram
///
/// Dense row-major `[mel_bands, num_frames]` array of dB values: row `b`
/// holds mel band `b` (lowest frequency first) across all frames. Immutable
/// once produced. Deserialization goes through [`Spectrogram::from_parts`], so
/// a decoded value satisfies the same shape checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpectrogram")]
pub struct Spectrogram {
    data: Vec<f32>,
    mel_bands: usize,
    num_frames: usize,
    sample_rate: u32,
    hop_size: usize,
}

impl Spectrogram {
    /// Assemble a spectrogram from row-major data
    ///
    /// # Errors
    ///
    /// Returns `SpectrogramError::InvalidConfiguration` if the data length
    /// does not equal `mel_bands * num_frames`, either dimension is 0, or the
    /// timing parameters are 0.
    pub fn from_parts(
        data: Vec<f32>,
        mel_bands: usize,
        num_frames: usize,
        sample_rate: u32,
        hop_size: usize,
    ) -> Result<Self, SpectrogramError> {
        if mel_bands == 0 || num_frames == 0 {
            return Err(SpectrogramError::InvalidConfiguration(format!(
                "Spectrogram shape must be non-empty, got [{}, {}]",
                mel_bands, num_frames
            )));
        }

        if data.len() != mel_bands * num_frames {
            return Err(SpectrogramError::InvalidConfiguration(format!(
                "Spectrogram data has {} values, shape [{}, {}] needs {}",
                data.len(),
                mel_bands,
                num_frames,
                mel_bands * num_frames
            )));
        }

        if sample_rate == 0 || hop_size == 0 {
            return Err(SpectrogramError::InvalidConfiguration(format!(
                "Spectrogram timing needs positive values, got sample_rate={}, hop_size={}",
                sample_rate, hop_size
            )));
        }

        Ok(Self {
            data,
            mel_bands,
            num_frames,
            sample_rate,
            hop_size,
        })
    }

    /// `[mel_bands, num_frames]`
    pub fn shape(&self) -> [usize; 2] {
        [self.mel_bands, self.num_frames]
    }

    /// Number of mel bands (rows)
    pub fn mel_bands(&self) -> usize {
        self.mel_bands
    }

    /// Number of time frames (columns)
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Sample rate of the source clip
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frame advance in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Row-major values
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(band, frame)`, if in range
    pub fn get(&self, band: usize, frame: usize) -> Option<f32> {
        if band < self.mel_bands && frame < self.num_frames {
            Some(self.data[band * self.num_frames + frame])
        } else {
            None
        }
    }

    /// All frames of one mel band
    pub fn band(&self, band: usize) -> Option<&[f32]> {
        if band < self.mel_bands {
            let start = band * self.num_frames;
            Some(&self.data[start..start + self.num_frames])
        } else {
            None
        }
    }

    /// Index of the loudest band in `frame`
    pub fn loudest_band(&self, frame: usize) -> Option<usize> {
        if frame >= self.num_frames {
            return None;
        }
        (0..self.mel_bands)
            .map(|b| (b, self.data[b * self.num_frames + frame]))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(b, _)| b)
    }

    /// Largest value
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Smallest value
    pub fn min_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Start time of `frame` in seconds
    pub fn frame_time_seconds(&self, frame: usize) -> f32 {
        (frame * self.hop_size) as f32 / self.sample_rate as f32
    }
}

/// Unchecked wire form of [`Spectrogram`]
#[derive(Deserialize)]
struct RawSpectrogram {
    data: Vec<f32>,
    mel_bands: usize,
    num_frames: usize,
    sample_rate: u32,
    hop_size: usize,
}

impl TryFrom<RawSpectrogram> for Spectrogram {
    type Error = SpectrogramError;

    fn try_from(raw: RawSpectrogram) -> Result<Self, Self::Error> {
        Spectrogram::from_parts(
            raw.data,
            raw.mel_bands,
            raw.num_frames,
            raw.sample_rate,
            raw.hop_size,
        )
    }
}

/// Reference to a persisted spectrogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Identity of the source clip (its file stem)
    pub source_id: String,

    /// Path of the stored `.npy` array
    pub storage_path: PathBuf,

    /// Path of the rendered `.png`, if one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,

    /// `[mel_bands, num_frames]`
    pub shape: [usize; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Spectrogram {
        // 2 bands x 3 frames
        Spectrogram::from_parts(vec![0.0, -1.0, -2.0, -3.0, -4.0, -5.0], 2, 3, 16000, 512).unwrap()
    }

    #[test]
    fn test_row_major_indexing() {
        let s = sample();
        assert_eq!(s.shape(), [2, 3]);
        assert_eq!(s.get(0, 2), Some(-2.0));
        assert_eq!(s.get(1, 0), Some(-3.0));
        assert_eq!(s.get(2, 0), None);
        assert_eq!(s.band(1), Some(&[-3.0, -4.0, -5.0][..]));
    }

    #[test]
    fn test_extremes_and_loudest_band() {
        let s = sample();
        assert_eq!(s.max_value(), 0.0);
        assert_eq!(s.min_value(), -5.0);
        assert_eq!(s.loudest_band(1), Some(0));
        assert_eq!(s.loudest_band(3), None);
    }

    #[test]
    fn test_frame_time() {
        let s = sample();
        assert!((s.frame_time_seconds(2) - 0.064).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_mismatched_shape() {
        assert!(Spectrogram::from_parts(vec![0.0; 5], 2, 3, 16000, 512).is_err());
        assert!(Spectrogram::from_parts(vec![], 0, 0, 16000, 512).is_err());
        assert!(Spectrogram::from_parts(vec![0.0; 6], 2, 3, 0, 512).is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_shape() {
        let s = sample();
        let json = serde_json::to_string(&s).unwrap();
        let back: Spectrogram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_deserialize_rejects_mismatched_data() {
        let json = r#"{"data":[0.0],"mel_bands":4,"num_frames":4,"sample_rate":16000,"hop_size":512}"#;
        let result = serde_json::from_str::<Spectrogram>(json);
        let err = result.expect_err("4x4 shape with one value must be rejected");
        assert!(err.to_string().contains("needs 16"), "{}", err);

        let zero_rate = r#"{"data":[0.0],"mel_bands":1,"num_frames":1,"sample_rate":0,"hop_size":512}"#;
        assert!(serde_json::from_str::<Spectrogram>(zero_rate).is_err());
    }

    #[test]
    fn test_record_serializes_without_missing_image() {
        let record = ArtifactRecord {
            source_id: "clip".to_string(),
            storage_path: PathBuf::from("out/clip.npy"),
            image_path: None,
            shape: [128, 28],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("image_path"));
        assert!(json.contains("\"shape\":[128,28]"));
    }
}
