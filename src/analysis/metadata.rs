//! Spectrogram generation metadata

use serde::{Deserialize, Serialize};

use crate::config::SpectralConfig;

/// Details of one generation run, reported next to the artifact record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrogramMetadata {
    /// Sample rate of the decoded clip in Hz
    pub sample_rate: u32,

    /// Number of decoded mono samples
    pub num_samples: usize,

    /// Clip duration in seconds
    pub duration_seconds: f32,

    /// Time spent in the spectral transform, in milliseconds
    pub processing_time_ms: f32,

    /// Crate version that produced the artifact
    pub algorithm_version: String,

    /// Parameters used
    pub config: SpectralConfig,
}

impl SpectrogramMetadata {
    /// Metadata for a clip processed with `config`
    pub fn new(
        sample_rate: u32,
        num_samples: usize,
        processing_time_ms: f32,
        config: SpectralConfig,
    ) -> Self {
        Self {
            sample_rate,
            num_samples,
            duration_seconds: num_samples as f32 / sample_rate.max(1) as f32,
            processing_time_ms,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            config,
        }
    }
}
