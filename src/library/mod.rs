//! Clip library management
//!
//! - Recording directory (save, list, resolve)
//! - Batch file-name normalisation

pub mod recordings;
pub mod rename;

pub use recordings::{RecordingEntry, RecordingLibrary};
pub use rename::{apply_renames, normalize_song_name, plan_renames, RenameReport};
