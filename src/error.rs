//! Error types for spectrogram extraction and artifact storage

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while decoding, transforming or persisting a clip
#[derive(Debug, Clone, PartialEq)]
pub enum SpectrogramError {
    /// Invalid parameters or input (caller's fault, not retryable as-is)
    InvalidConfiguration(String),

    /// Audio could not be opened or decoded
    DecodeFailure(String),

    /// A non-finite value escaped the dB conversion
    NumericDomainError(String),

    /// Artifact destination could not be written
    StorageWriteFailure {
        /// Destination path
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// Stored artifact could not be read back
    StorageReadFailure {
        /// Source path
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// Requested recording does not exist in the library
    RecordingNotFound(String),
}

impl SpectrogramError {
    pub(crate) fn write_failure(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        SpectrogramError::StorageWriteFailure {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn read_failure(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        SpectrogramError::StorageReadFailure {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SpectrogramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrogramError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            SpectrogramError::DecodeFailure(msg) => write!(f, "Decode failure: {}", msg),
            SpectrogramError::NumericDomainError(msg) => write!(f, "Numeric domain error: {}", msg),
            SpectrogramError::StorageWriteFailure { path, message } => {
                write!(f, "Storage write failure at {}: {}", path.display(), message)
            }
            SpectrogramError::StorageReadFailure { path, message } => {
                write!(f, "Storage read failure at {}: {}", path.display(), message)
            }
            SpectrogramError::RecordingNotFound(name) => {
                write!(f, "Recording not found: {}", name)
            }
        }
    }
}

impl std::error::Error for SpectrogramError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = SpectrogramError::write_failure("/tmp/out/clip.npy", "permission denied");
        let text = err.to_string();
        assert!(text.contains("/tmp/out/clip.npy"));
        assert!(text.contains("permission denied"));
    }

    #[test]
    fn test_write_and_read_failures_are_distinct() {
        let write = SpectrogramError::write_failure("a.npy", "x");
        let read = SpectrogramError::read_failure("a.npy", "x");
        assert_ne!(write, read);
    }
}
