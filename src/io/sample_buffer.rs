//! Mono waveform buffer handed from the decoder to the spectral transform

use crate::error::SpectrogramError;

/// Mono audio samples at a known sample rate
///
/// Samples are expected in [-1.0, 1.0]. The buffer is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl WaveformBuffer {
    /// Wrap mono samples
    ///
    /// # Errors
    ///
    /// Returns `SpectrogramError::InvalidConfiguration` if `sample_rate` is 0.
    /// An empty sample vector is accepted here and rejected by the transform.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, SpectrogramError> {
        if sample_rate == 0 {
            return Err(SpectrogramError::InvalidConfiguration(
                "sample_rate must be > 0".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Sample data
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Give the samples back to the caller
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_sample_rate() {
        assert!(WaveformBuffer::new(vec![0.0; 10], 0).is_err());
    }

    #[test]
    fn test_duration() {
        let buffer = WaveformBuffer::new(vec![0.0; 8000], 16000).unwrap();
        assert_eq!(buffer.len(), 8000);
        assert!((buffer.duration_seconds() - 0.5).abs() < 1e-6);
    }
}
