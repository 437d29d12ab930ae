//! Deterministic artifact naming
//!
//! An artifact carries its source clip's base name with a different
//! extension, so it can be located from the clip name alone.

use std::path::{Path, PathBuf};

use crate::error::SpectrogramError;

/// Extension of stored spectrogram arrays
pub const ARRAY_EXTENSION: &str = "npy";

/// Extension of rendered spectrogram images
pub const IMAGE_EXTENSION: &str = "png";

/// Source identity of a clip: its file name without extension
///
/// # Errors
///
/// Returns `SpectrogramError::InvalidConfiguration` if the path has no usable
/// file stem.
pub fn source_id_for(path: impl AsRef<Path>) -> Result<String, SpectrogramError> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            SpectrogramError::InvalidConfiguration(format!(
                "Cannot derive a source id from {}",
                path.display()
            ))
        })?;
    Ok(stem.to_string())
}

/// Reject ids that would escape the artifact directory or be ambiguous
pub fn validate_source_id(source_id: &str) -> Result<(), SpectrogramError> {
    let bad = source_id.is_empty()
        || source_id == "."
        || source_id == ".."
        || source_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(SpectrogramError::InvalidConfiguration(format!(
            "Invalid source id {:?}",
            source_id
        )));
    }
    Ok(())
}

/// `<root>/<source_id>.<extension>`
pub fn artifact_path(root: &Path, source_id: &str, extension: &str) -> PathBuf {
    root.join(format!("{}.{}", source_id, extension))
}
