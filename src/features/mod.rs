//! Feature extraction modules
//!
//! - Mel spectrogram (STFT, mel filterbank, dB conversion)

pub mod melspec;
