//! Result types
//!
//! - Spectrogram value and the record of where it was persisted
//! - Generation metadata

pub mod metadata;
pub mod result;
