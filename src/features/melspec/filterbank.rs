//! Triangular mel filterbank
//!
//! Filters are spaced evenly on the Slaney mel scale (linear below 1 kHz,
//! logarithmic above) between 0 Hz and Nyquist and are area-normalised so
//! that each filter has unit energy per Hz of bandwidth.
//!
//! # Reference
//!
//! Slaney, M. (1998). Auditory Toolbox, Version 2. *Interval Research
//! Corporation Technical Report* #1998-010.

use crate::error::SpectrogramError;

/// Width of one mel step in the linear region (Hz)
const F_SP: f64 = 200.0 / 3.0;

/// Frequency where the scale switches from linear to logarithmic (Hz)
const MIN_LOG_HZ: f64 = 1000.0;

/// Mel value at `MIN_LOG_HZ`
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

/// Convert frequency in Hz to Slaney mel
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert Slaney mel to frequency in Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// One triangular filter, stored as its non-zero span only
#[derive(Debug, Clone, PartialEq)]
struct MelBand {
    first_bin: usize,
    weights: Vec<f32>,
}

/// Mel filterbank for one `(sample_rate, fft_size, mel_bands)` triple
///
/// Immutable after construction; shared between transforms through the
/// [`FilterbankCache`](super::cache::FilterbankCache).
#[derive(Debug, Clone, PartialEq)]
pub struct MelFilterbank {
    sample_rate: u32,
    fft_size: usize,
    bands: Vec<MelBand>,
    center_hz: Vec<f32>,
}

impl MelFilterbank {
    /// Build the filterbank
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `fft_size` - FFT length; the filterbank spans `fft_size / 2 + 1` bins
    /// * `mel_bands` - Number of filters
    ///
    /// # Errors
    ///
    /// Returns `SpectrogramError::InvalidConfiguration` if any argument is 0.
    pub fn new(
        sample_rate: u32,
        fft_size: usize,
        mel_bands: usize,
    ) -> Result<Self, SpectrogramError> {
        if sample_rate == 0 || fft_size == 0 || mel_bands == 0 {
            return Err(SpectrogramError::InvalidConfiguration(format!(
                "Filterbank needs positive parameters, got sample_rate={}, fft_size={}, mel_bands={}",
                sample_rate, fft_size, mel_bands
            )));
        }

        log::debug!(
            "Building mel filterbank: sample_rate={} Hz, fft_size={}, mel_bands={}",
            sample_rate,
            fft_size,
            mel_bands
        );

        let n_bins = fft_size / 2 + 1;
        let sr = sample_rate as f64;
        let bin_hz: Vec<f64> = (0..n_bins)
            .map(|k| k as f64 * sr / fft_size as f64)
            .collect();

        // mel_bands + 2 edge frequencies: band m spans edges[m]..edges[m + 2]
        let mel_min = hz_to_mel(0.0);
        let mel_max = hz_to_mel(sr / 2.0);
        let edges: Vec<f64> = (0..mel_bands + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (mel_bands + 1) as f64))
            .collect();

        let mut bands = Vec::with_capacity(mel_bands);
        let mut empty_bands = 0usize;

        for m in 0..mel_bands {
            let left = edges[m];
            let center = edges[m + 1];
            let right = edges[m + 2];
            let norm = 2.0 / (right - left);

            let weights: Vec<f32> = bin_hz
                .iter()
                .map(|&hz| {
                    let rising = (hz - left) / (center - left);
                    let falling = (right - hz) / (right - center);
                    (rising.min(falling).max(0.0) * norm) as f32
                })
                .collect();

            match weights.iter().position(|&w| w > 0.0) {
                Some(first_bin) => {
                    let last_bin = weights.iter().rposition(|&w| w > 0.0).unwrap_or(first_bin);
                    bands.push(MelBand {
                        first_bin,
                        weights: weights[first_bin..=last_bin].to_vec(),
                    });
                }
                None => {
                    empty_bands += 1;
                    bands.push(MelBand {
                        first_bin: 0,
                        weights: Vec::new(),
                    });
                }
            }
        }

        if empty_bands > 0 {
            log::warn!(
                "{} of {} mel bands cover no FFT bin (fft_size={} too small for sample_rate={}); they will sit at the dB floor",
                empty_bands,
                mel_bands,
                fft_size,
                sample_rate
            );
        }

        let center_hz = edges[1..=mel_bands].iter().map(|&hz| hz as f32).collect();

        Ok(Self {
            sample_rate,
            fft_size,
            bands,
            center_hz,
        })
    }

    /// Number of mel bands
    pub fn mel_bands(&self) -> usize {
        self.bands.len()
    }

    /// Number of FFT bins the filterbank expects
    pub fn n_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Sample rate the filterbank was built for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Center frequency of every band in Hz, lowest first
    pub fn center_frequencies(&self) -> &[f32] {
        &self.center_hz
    }

    /// Index of the band whose center frequency is closest to `hz`
    pub fn nearest_band(&self, hz: f32) -> usize {
        self.center_hz
            .iter()
            .enumerate()
            .min_by(|a, b| {
                (a.1 - hz)
                    .abs()
                    .partial_cmp(&(b.1 - hz).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Weight of FFT bin `bin` in band `band` (0 outside the triangle)
    pub fn weight(&self, band: usize, bin: usize) -> f32 {
        self.bands
            .get(band)
            .and_then(|b| bin.checked_sub(b.first_bin).and_then(|i| b.weights.get(i)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Project one power spectrum frame onto the mel bands
    ///
    /// `power` must hold `n_bins()` values and `out` `mel_bands()` values.
    pub fn apply(&self, power: &[f32], out: &mut [f32]) {
        debug_assert_eq!(power.len(), self.n_bins());
        debug_assert_eq!(out.len(), self.bands.len());

        for (band, energy) in self.bands.iter().zip(out.iter_mut()) {
            let span = &power[band.first_bin..band.first_bin + band.weights.len()];
            *energy = span
                .iter()
                .zip(band.weights.iter())
                .map(|(p, w)| p * w)
                .sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [0.0, 250.0, 999.0, 1000.0, 4000.0, 11025.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 1e-6, "{} -> {}", hz, back);
        }
    }

    #[test]
    fn test_mel_scale_is_linear_below_1khz() {
        assert!((hz_to_mel(200.0) - 3.0).abs() < 1e-9);
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_zero_parameters() {
        assert!(MelFilterbank::new(0, 2048, 128).is_err());
        assert!(MelFilterbank::new(16000, 0, 128).is_err());
        assert!(MelFilterbank::new(16000, 2048, 0).is_err());
    }

    #[test]
    fn test_shape_and_centers() {
        let fb = MelFilterbank::new(16000, 2048, 128).unwrap();
        assert_eq!(fb.mel_bands(), 128);
        assert_eq!(fb.n_bins(), 1025);

        let centers = fb.center_frequencies();
        assert_eq!(centers.len(), 128);
        assert!(centers.windows(2).all(|w| w[1] > w[0]));
        assert!(centers[127] < 8000.0);
    }

    #[test]
    fn test_weights_are_triangular_and_non_negative() {
        let fb = MelFilterbank::new(22050, 1024, 40).unwrap();
        for band in 0..fb.mel_bands() {
            let weights: Vec<f32> = (0..fb.n_bins()).map(|k| fb.weight(band, k)).collect();
            assert!(weights.iter().all(|&w| w >= 0.0));

            // Rises then falls: at most one local maximum run
            let peak = weights
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap();
            assert!(weights[..=peak].windows(2).all(|w| w[1] >= w[0]));
            assert!(weights[peak..].windows(2).all(|w| w[1] <= w[0]));
        }
    }

    #[test]
    fn test_apply_matches_dense_product() {
        let fb = MelFilterbank::new(8000, 256, 20).unwrap();
        let power: Vec<f32> = (0..fb.n_bins()).map(|k| (k as f32 * 0.37).sin().abs()).collect();
        let mut out = vec![0.0f32; fb.mel_bands()];
        fb.apply(&power, &mut out);

        for band in 0..fb.mel_bands() {
            let dense: f32 = (0..fb.n_bins()).map(|k| fb.weight(band, k) * power[k]).sum();
            assert!((dense - out[band]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_nearest_band() {
        let fb = MelFilterbank::new(16000, 2048, 128).unwrap();
        let band = fb.nearest_band(440.0);
        let center = fb.center_frequencies()[band];
        assert!((center - 440.0).abs() < 15.0, "center {}", center);
    }
}
