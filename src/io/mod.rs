//! Audio I/O modules
//!
//! Audio decoding with Symphonia and the mono waveform buffer it produces.

pub mod decoder;
pub mod sample_buffer;

pub use decoder::decode_audio;
pub use sample_buffer::WaveformBuffer;
