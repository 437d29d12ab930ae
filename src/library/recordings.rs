//! Recording directory
//!
//! Saves uploaded clips under timestamped names and enumerates or resolves
//! them by file name. Listing reads the directory at call time.
//!
//! Clips are stored as `.webm` byte-for-byte. Browser recordings in that
//! container usually carry Opus audio, which [`decode_audio`](crate::decode_audio)
//! cannot decode; such clips must be transcoded before a spectrogram can be
//! generated from them.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SpectrogramError;

/// Extension used for saved recordings
pub const RECORDING_EXTENSION: &str = "webm";

/// A recording present in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingEntry {
    /// File name within the library directory
    pub filename: String,
    /// Full path
    #[serde(skip)]
    pub path: PathBuf,
}

/// `recording_YYYYmmdd_HHMMSS.webm`
pub fn recording_file_name(timestamp: NaiveDateTime) -> String {
    format!(
        "recording_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        RECORDING_EXTENSION
    )
}

/// Directory of recorded clips
#[derive(Debug, Clone)]
pub struct RecordingLibrary {
    dir: PathBuf,
}

impl RecordingLibrary {
    /// Open a library, creating the directory if missing
    ///
    /// # Errors
    ///
    /// Returns `SpectrogramError::StorageWriteFailure` if the directory cannot
    /// be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SpectrogramError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SpectrogramError::write_failure(&dir, e))?;
        Ok(Self { dir })
    }

    /// Library directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream a recording into the library under a timestamped name
    ///
    /// An existing file with the same name is overwritten.
    pub fn save<R: Read>(
        &self,
        reader: &mut R,
        timestamp: NaiveDateTime,
    ) -> Result<RecordingEntry, SpectrogramError> {
        let filename = recording_file_name(timestamp);
        let path = self.dir.join(&filename);

        let file = File::create(&path).map_err(|e| SpectrogramError::write_failure(&path, e))?;
        let mut writer = BufWriter::new(file);
        let bytes = io::copy(reader, &mut writer)
            .and_then(|n| writer.flush().map(|_| n))
            .map_err(|e| SpectrogramError::write_failure(&path, e))?;

        log::info!("Saved recording {} ({} bytes)", path.display(), bytes);
        Ok(RecordingEntry { filename, path })
    }

    /// Every regular file currently in the library, sorted by name
    pub fn list(&self) -> Result<Vec<RecordingEntry>, SpectrogramError> {
        let read_dir =
            fs::read_dir(&self.dir).map_err(|e| SpectrogramError::read_failure(&self.dir, e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| SpectrogramError::read_failure(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                entries.push(RecordingEntry {
                    filename: filename.to_string(),
                    path: path.clone(),
                });
            } else {
                log::warn!("Skipping non-UTF-8 file name in {}", self.dir.display());
            }
        }

        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(entries)
    }

    /// Resolve a recording by file name
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if the name contains a path separator
    /// - `RecordingNotFound` if no such file exists
    pub fn path_of(&self, filename: &str) -> Result<PathBuf, SpectrogramError> {
        if filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['/', '\\'])
        {
            return Err(SpectrogramError::InvalidConfiguration(format!(
                "Invalid recording name {:?}",
                filename
            )));
        }

        let path = self.dir.join(filename);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SpectrogramError::RecordingNotFound(filename.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(recording_file_name(at(7, 5, 3)), "recording_20240309_070503.webm");
    }

    #[test]
    fn test_save_then_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let library = RecordingLibrary::open(dir.path().join("recordings")).unwrap();

        let entry = library.save(&mut &b"webm bytes"[..], at(12, 0, 0)).unwrap();
        assert_eq!(entry.filename, "recording_20240309_120000.webm");
        assert_eq!(std::fs::read(&entry.path).unwrap(), b"webm bytes");
        assert_eq!(library.path_of(&entry.filename).unwrap(), entry.path);
    }

    #[test]
    fn test_list_reflects_directory_now() {
        let dir = tempfile::tempdir().unwrap();
        let library = RecordingLibrary::open(dir.path()).unwrap();
        assert!(library.list().unwrap().is_empty());

        library.save(&mut &b"b"[..], at(10, 0, 1)).unwrap();
        library.save(&mut &b"a"[..], at(10, 0, 0)).unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let names: Vec<String> = library.list().unwrap().into_iter().map(|e| e.filename).collect();
        assert_eq!(
            names,
            vec![
                "recording_20240309_100000.webm".to_string(),
                "recording_20240309_100001.webm".to_string()
            ]
        );

        std::fs::remove_file(dir.path().join("recording_20240309_100000.webm")).unwrap();
        assert_eq!(library.list().unwrap().len(), 1);
    }

    #[test]
    fn test_path_of_errors() {
        let dir = tempfile::tempdir().unwrap();
        let library = RecordingLibrary::open(dir.path()).unwrap();
        assert!(matches!(
            library.path_of("missing.webm"),
            Err(SpectrogramError::RecordingNotFound(_))
        ));
        assert!(matches!(
            library.path_of("../etc/passwd"),
            Err(SpectrogramError::InvalidConfiguration(_))
        ));
    }
}
