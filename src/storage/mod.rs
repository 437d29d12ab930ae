//! Artifact storage
//!
//! Persists spectrograms under names derived from their source clip:
//! `<root>/<source_id>.npy` and, optionally, `<root>/<source_id>.png`.

pub mod naming;
pub mod npy;
pub mod render;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::analysis::result::{ArtifactRecord, Spectrogram};
use crate::config::StoreOptions;
use crate::error::SpectrogramError;

use self::naming::{artifact_path, validate_source_id, ARRAY_EXTENSION, IMAGE_EXTENSION};
use self::npy::{read_npy_f32, write_npy_f32, NpyArray};

/// Destination for computed spectrograms
///
/// Implementations must not mutate the spectrogram and must report an
/// unwritable destination as `SpectrogramError::StorageWriteFailure`.
pub trait ArtifactStore: Send + Sync {
    /// Persist a spectrogram under a name derived from `source_id`
    ///
    /// On error no artifact for `source_id` is left half-written.
    fn persist(
        &self,
        source_id: &str,
        spectrogram: &Spectrogram,
    ) -> Result<ArtifactRecord, SpectrogramError>;
}

/// Filesystem artifact store
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    options: StoreOptions,
}

impl FsArtifactStore {
    /// Open a store rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `SpectrogramError::StorageWriteFailure` if the directory cannot
    /// be created.
    pub fn new(root: impl Into<PathBuf>, options: StoreOptions) -> Result<Self, SpectrogramError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| SpectrogramError::write_failure(&root, e))?;
        log::debug!("Artifact store at {}", root.display());
        Ok(Self { root, options })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store options
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Where the array for `source_id` lives (whether or not it exists yet)
    pub fn array_path(&self, source_id: &str) -> PathBuf {
        artifact_path(&self.root, source_id, ARRAY_EXTENSION)
    }

    /// Where the image for `source_id` lives (whether or not it exists yet)
    pub fn image_path(&self, source_id: &str) -> PathBuf {
        artifact_path(&self.root, source_id, IMAGE_EXTENSION)
    }

    /// True if an array for `source_id` has been stored
    pub fn contains(&self, source_id: &str) -> bool {
        validate_source_id(source_id).is_ok() && self.array_path(source_id).is_file()
    }

    /// Read a stored array back
    ///
    /// # Errors
    ///
    /// Returns `SpectrogramError::StorageReadFailure` if the file is missing
    /// or malformed.
    pub fn load_array(&self, source_id: &str) -> Result<NpyArray, SpectrogramError> {
        validate_source_id(source_id)?;
        let path = self.array_path(source_id);
        let file = File::open(&path).map_err(|e| SpectrogramError::read_failure(&path, e))?;
        read_npy_f32(&mut BufReader::new(file)).map_err(|e| SpectrogramError::read_failure(&path, e))
    }

    fn write_array(&self, path: &Path, spectrogram: &Spectrogram) -> Result<(), SpectrogramError> {
        let file = File::create(path).map_err(|e| SpectrogramError::write_failure(path, e))?;
        let mut writer = BufWriter::new(file);
        write_npy_f32(&mut writer, &spectrogram.shape(), spectrogram.data())
            .map_err(|e| SpectrogramError::write_failure(path, e))
    }

    fn write_image(&self, path: &Path, spectrogram: &Spectrogram) -> Result<(), SpectrogramError> {
        let file = File::create(path).map_err(|e| SpectrogramError::write_failure(path, e))?;
        render::write_png(spectrogram, &self.options, BufWriter::new(file))
            .map_err(|e| SpectrogramError::write_failure(path, e))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn persist(
        &self,
        source_id: &str,
        spectrogram: &Spectrogram,
    ) -> Result<ArtifactRecord, SpectrogramError> {
        validate_source_id(source_id)?;

        let storage_path = self.array_path(source_id);
        self.write_array(&storage_path, spectrogram)?;
        log::info!("Saved spectrogram array: {}", storage_path.display());

        let image_path = if self.options.render_image {
            let path = self.image_path(source_id);
            if let Err(e) = self.write_image(&path, spectrogram) {
                // Drop the array so a failed persist leaves nothing behind
                if let Err(cleanup) = fs::remove_file(&storage_path) {
                    log::warn!(
                        "Could not remove {} after image failure: {}",
                        storage_path.display(),
                        cleanup
                    );
                }
                return Err(e);
            }
            log::info!("Saved spectrogram image: {}", path.display());
            Some(path)
        } else {
            None
        };

        Ok(ArtifactRecord {
            source_id: source_id.to_string(),
            storage_path,
            image_path,
            shape: spectrogram.shape(),
        })
    }
}
