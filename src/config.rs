//! Configuration parameters for spectrogram extraction

use serde::{Deserialize, Serialize};

use crate::error::SpectrogramError;

/// How the 0 dB reference of the log-power conversion is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "value", rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Reference is the peak power of the whole clip (output is ≤ 0 dB)
    #[default]
    ClipPeak,
    /// Reference is a fixed power value
    Fixed(f32),
}

/// Spectral transform parameters
///
/// Supplied once per transform and never mutated while it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Analysis window length in samples (default: 2048)
    pub fft_size: usize,

    /// Frame advance in samples, at most `fft_size` (default: 512)
    pub hop_size: usize,

    /// Number of mel filterbank channels (default: 128)
    pub mel_bands: usize,

    /// dB reference policy (default: clip peak)
    pub reference: ReferencePolicy,

    /// Power floor applied before taking the log (default: 1e-10)
    pub amin: f32,

    /// Dynamic range kept below the loudest value, in dB (default: 80.0)
    ///
    /// `None` disables the clamp.
    pub top_db: Option<f32>,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop_size: 512,
            mel_bands: 128,
            reference: ReferencePolicy::ClipPeak,
            amin: 1e-10,
            top_db: Some(80.0),
        }
    }
}

impl SpectralConfig {
    /// Set the window length
    pub fn with_fft_size(mut self, fft_size: usize) -> Self {
        self.fft_size = fft_size;
        self
    }

    /// Set the frame advance
    pub fn with_hop_size(mut self, hop_size: usize) -> Self {
        self.hop_size = hop_size;
        self
    }

    /// Set the number of mel bands
    pub fn with_mel_bands(mut self, mel_bands: usize) -> Self {
        self.mel_bands = mel_bands;
        self
    }

    /// Set the dB reference policy
    pub fn with_reference(mut self, reference: ReferencePolicy) -> Self {
        self.reference = reference;
        self
    }

    /// Set or disable the dynamic range clamp
    pub fn with_top_db(mut self, top_db: Option<f32>) -> Self {
        self.top_db = top_db;
        self
    }

    /// Check every parameter before any work begins
    ///
    /// # Errors
    ///
    /// Returns `SpectrogramError::InvalidConfiguration` naming the first
    /// offending parameter.
    pub fn validate(&self) -> Result<(), SpectrogramError> {
        if self.fft_size == 0 {
            return Err(SpectrogramError::InvalidConfiguration(
                "fft_size must be > 0".to_string(),
            ));
        }

        if self.hop_size == 0 {
            return Err(SpectrogramError::InvalidConfiguration(
                "hop_size must be > 0".to_string(),
            ));
        }

        if self.hop_size > self.fft_size {
            return Err(SpectrogramError::InvalidConfiguration(format!(
                "hop_size ({}) must not exceed fft_size ({})",
                self.hop_size, self.fft_size
            )));
        }

        if self.mel_bands == 0 {
            return Err(SpectrogramError::InvalidConfiguration(
                "mel_bands must be > 0".to_string(),
            ));
        }

        if !(self.amin.is_finite() && self.amin > 0.0) {
            return Err(SpectrogramError::InvalidConfiguration(format!(
                "amin must be a positive finite value, got {}",
                self.amin
            )));
        }

        if let ReferencePolicy::Fixed(reference) = self.reference {
            if !(reference.is_finite() && reference > 0.0) {
                return Err(SpectrogramError::InvalidConfiguration(format!(
                    "Fixed reference must be a positive finite value, got {}",
                    reference
                )));
            }
        }

        if let Some(top_db) = self.top_db {
            if !(top_db.is_finite() && top_db >= 0.0) {
                return Err(SpectrogramError::InvalidConfiguration(format!(
                    "top_db must be a non-negative finite value, got {}",
                    top_db
                )));
            }
        }

        if !self.fft_size.is_power_of_two() {
            log::warn!(
                "fft_size {} is not a power of two; FFT will be slower",
                self.fft_size
            );
        }

        Ok(())
    }
}

/// Artifact store options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Also write a rendered `.png` next to the `.npy` (default: false)
    pub render_image: bool,

    /// Height in pixels of each mel row in the rendered image (default: 2)
    pub pixels_per_band: u32,

    /// Width in pixels of each frame column in the rendered image (default: 2)
    pub pixels_per_frame: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            render_image: false,
            pixels_per_band: 2,
            pixels_per_frame: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SpectralConfig::default().validate().is_ok());
    }

    #[test]
    fn test_reference_defaults_to_clip_peak() {
        assert_eq!(ReferencePolicy::default(), ReferencePolicy::ClipPeak);
        let json = serde_json::to_string(&ReferencePolicy::default()).unwrap();
        assert_eq!(json, r#"{"policy":"clip_peak"}"#);
    }

    #[test]
    fn test_rejects_zero_parameters() {
        let base = SpectralConfig::default();
        for config in [
            base.clone().with_fft_size(0),
            base.clone().with_hop_size(0),
            base.clone().with_mel_bands(0),
        ] {
            assert!(matches!(
                config.validate(),
                Err(SpectrogramError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_rejects_hop_larger_than_window() {
        let config = SpectralConfig::default().with_fft_size(256).with_hop_size(512);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_fixed_reference() {
        let config = SpectralConfig::default().with_reference(ReferencePolicy::Fixed(0.0));
        assert!(config.validate().is_err());

        let config = SpectralConfig::default().with_reference(ReferencePolicy::Fixed(f32::NAN));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_top_db() {
        let config = SpectralConfig::default().with_top_db(Some(-1.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_partial_config_uses_defaults() {
        let config: SpectralConfig =
            serde_json::from_str(r#"{"fft_size": 1024, "reference": {"policy": "fixed", "value": 1.0}}"#)
                .unwrap();
        assert_eq!(config.fft_size, 1024);
        assert_eq!(config.hop_size, 512);
        assert_eq!(config.reference, ReferencePolicy::Fixed(1.0));
        assert_eq!(config.top_db, Some(80.0));
    }
}
