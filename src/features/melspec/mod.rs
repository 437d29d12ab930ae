//! Mel spectrogram transform
//!
//! Turns a mono waveform into a `[mel_bands, num_frames]` matrix of dB values.
//!
//! Algorithm:
//! 1. Split samples into frames of `fft_size`, advancing by `hop_size`
//!    (a buffer shorter than one window becomes one zero-padded frame)
//! 2. Apply a periodic Hann window
//! 3. Power spectrum `|X[k]|²` for `k = 0..=fft_size/2`
//! 4. Project onto a triangular Slaney mel filterbank (0 Hz to Nyquist)
//! 5. `10·log10(max(p, amin) / max(ref, amin))`, `ref` being the clip peak or
//!    a fixed power, then optional `top_db` clamp
//!
//! # Example
//!
//! ```no_run
//! use clipgram::features::melspec::SpectralEngine;
//! use clipgram::io::WaveformBuffer;
//! use clipgram::SpectralConfig;
//!
//! let engine = SpectralEngine::new();
//! let waveform = WaveformBuffer::new(vec![0.0f32; 16000], 16000)?;
//! let spectrogram = engine.transform(&waveform, &SpectralConfig::default())?;
//! assert_eq!(spectrogram.shape(), [128, 28]);
//! # Ok::<(), clipgram::SpectrogramError>(())
//! ```

pub mod cache;
pub mod decibel;
pub mod filterbank;
pub mod framing;
pub mod stft;
pub mod window;

use std::sync::Arc;

use self::cache::FilterbankCache;
use self::decibel::power_to_db_in_place;
use self::filterbank::MelFilterbank;
use self::framing::frame_count;
use self::stft::StftAnalyzer;
use crate::analysis::result::Spectrogram;
use crate::config::SpectralConfig;
use crate::error::SpectrogramError;
use crate::io::WaveformBuffer;

/// Spectral transform engine
///
/// Owns the filterbank cache. The transform itself is synchronous and keeps
/// no state between calls, so one engine can be shared across threads.
#[derive(Debug, Default)]
pub struct SpectralEngine {
    filterbanks: FilterbankCache,
}

impl SpectralEngine {
    /// Create an engine with an empty filterbank cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the mel spectrogram of a waveform
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if the waveform is empty or `config` fails
    ///   [`SpectralConfig::validate`]; checked before any work
    /// - `NumericDomainError` if a non-finite dB value is produced
    pub fn transform(
        &self,
        waveform: &WaveformBuffer,
        config: &SpectralConfig,
    ) -> Result<Spectrogram, SpectrogramError> {
        if waveform.is_empty() {
            return Err(SpectrogramError::InvalidConfiguration(
                "Empty audio samples".to_string(),
            ));
        }
        config.validate()?;

        let samples = waveform.samples();
        let sample_rate = waveform.sample_rate();
        let num_frames = frame_count(samples.len(), config.fft_size, config.hop_size);

        log::debug!(
            "Computing mel spectrogram: {} samples at {} Hz, fft={}, hop={}, mels={}, frames={}",
            samples.len(),
            sample_rate,
            config.fft_size,
            config.hop_size,
            config.mel_bands,
            num_frames
        );

        if samples.len() < config.fft_size {
            log::debug!(
                "Input shorter than one window ({} < {}), zero-padding to a single frame",
                samples.len(),
                config.fft_size
            );
        }

        let filterbank = self.filterbank(sample_rate, config.fft_size, config.mel_bands)?;
        let mut stft = StftAnalyzer::new(config.fft_size);
        let mut power = vec![0.0f32; stft.n_bins()];
        let mut column = vec![0.0f32; config.mel_bands];

        // Row-major [mel_bands, num_frames]
        let mut mel = vec![0.0f32; config.mel_bands * num_frames];
        for frame in 0..num_frames {
            stft.power_frame(samples, frame, config.hop_size, &mut power);
            filterbank.apply(&power, &mut column);
            for (band, &energy) in column.iter().enumerate() {
                mel[band * num_frames + frame] = energy;
            }
        }

        power_to_db_in_place(&mut mel, config.reference, config.amin, config.top_db)?;

        Spectrogram::from_parts(
            mel,
            config.mel_bands,
            num_frames,
            sample_rate,
            config.hop_size,
        )
    }

    /// Filterbank for a `(sample_rate, fft_size, mel_bands)` triple, built on
    /// first request and cached afterwards
    pub fn filterbank(
        &self,
        sample_rate: u32,
        fft_size: usize,
        mel_bands: usize,
    ) -> Result<Arc<MelFilterbank>, SpectrogramError> {
        self.filterbanks.get_or_build(sample_rate, fft_size, mel_bands)
    }

    /// Number of filterbanks built so far
    pub fn cached_filterbanks(&self) -> usize {
        self.filterbanks.len()
    }
}
