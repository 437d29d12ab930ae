//! Audio preprocessing modules
//!
//! Utilities for preparing decoded audio for the spectral transform:
//! - Channel mixing (multi-channel to mono)

pub mod channel_mixer;
