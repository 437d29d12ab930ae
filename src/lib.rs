//! # clipgram
//!
//! Mel spectrogram extraction for short recorded audio clips, with
//! deterministic artifact storage.
//!
//! ## Features
//!
//! - **Decoding**: any format Symphonia supports, downmixed to mono at the
//!   native sample rate
//! - **Mel spectrogram**: Hann-windowed STFT, Slaney mel filterbank, log-power
//!   in dB relative to the clip peak (or a fixed reference)
//! - **Artifacts**: NumPy `.npy` arrays and optional `.png` renderings named
//!   after the source clip
//! - **Library**: timestamped recording storage and batch file-name
//!   normalisation
//!
//! ## Quick Start
//!
//! ```no_run
//! use clipgram::{compute_spectrogram, SpectralConfig};
//!
//! // Mono f32 samples, normalized to [-1.0, 1.0]
//! let samples: Vec<f32> = vec![0.0; 16000];
//! let spectrogram = compute_spectrogram(&samples, 16000, &SpectralConfig::default())?;
//!
//! println!("Shape: {:?}", spectrogram.shape()); // [128, 28]
//! # Ok::<(), clipgram::SpectrogramError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio file → Decoder → Spectral transform → Artifact store
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod library;
pub mod pipeline;
pub mod preprocessing;
pub mod storage;

// Re-export main types
pub use analysis::metadata::SpectrogramMetadata;
pub use analysis::result::{ArtifactRecord, Spectrogram};
pub use config::{ReferencePolicy, SpectralConfig, StoreOptions};
pub use error::SpectrogramError;
pub use features::melspec::SpectralEngine;
pub use io::{decode_audio, WaveformBuffer};
pub use pipeline::{generate_batch, generate_spectrogram, GeneratedArtifact};
pub use storage::{ArtifactStore, FsArtifactStore};

/// Compute the mel spectrogram of mono samples
///
/// Convenience wrapper around [`SpectralEngine::transform`] with a fresh
/// engine. Hold a [`SpectralEngine`] instead when processing many clips so the
/// mel filterbank is built once per `(sample_rate, fft_size, mel_bands)`.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Transform parameters
///
/// # Returns
///
/// `[mel_bands, num_frames]` matrix of dB values
///
/// # Errors
///
/// Returns `SpectrogramError::InvalidConfiguration` for empty input, a zero
/// sample rate or invalid parameters, and `NumericDomainError` if a non-finite
/// value is produced.
///
/// # Example
///
/// ```
/// use clipgram::{compute_spectrogram, SpectralConfig};
///
/// let samples = vec![0.0f32; 100];
/// let spectrogram = compute_spectrogram(&samples, 16000, &SpectralConfig::default())?;
/// assert_eq!(spectrogram.shape(), [128, 1]);
/// # Ok::<(), clipgram::SpectrogramError>(())
/// ```
pub fn compute_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    config: &SpectralConfig,
) -> Result<Spectrogram, SpectrogramError> {
    let waveform = WaveformBuffer::new(samples.to_vec(), sample_rate)?;
    SpectralEngine::new().transform(&waveform, config)
}
