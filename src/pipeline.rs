//! Decode → transform → persist
//!
//! Wires the decoder, the spectral engine and an artifact store together for
//! one clip or a batch. Batches run clips in parallel with rayon; each clip's
//! transform stays single-threaded and all clips share the engine's
//! filterbank cache.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::metadata::SpectrogramMetadata;
use crate::analysis::result::ArtifactRecord;
use crate::config::SpectralConfig;
use crate::error::SpectrogramError;
use crate::features::melspec::SpectralEngine;
use crate::io::decode_audio;
use crate::storage::naming::source_id_for;
use crate::storage::ArtifactStore;

/// Record of a persisted spectrogram plus how it was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Where the spectrogram was stored
    pub record: ArtifactRecord,
    /// Generation details
    pub metadata: SpectrogramMetadata,
}

/// Decode one clip, compute its spectrogram and persist it
///
/// The artifact is named after the clip's file stem.
///
/// # Errors
///
/// - `InvalidConfiguration` for a path without a stem or a bad `config`
/// - `DecodeFailure` if the clip cannot be decoded
/// - `NumericDomainError` from the transform
/// - `StorageWriteFailure` if the store cannot write
pub fn generate_spectrogram<S: ArtifactStore + ?Sized>(
    path: impl AsRef<Path>,
    engine: &SpectralEngine,
    store: &S,
    config: &SpectralConfig,
) -> Result<GeneratedArtifact, SpectrogramError> {
    let path = path.as_ref();
    let source_id = source_id_for(path)?;
    config.validate()?;

    let waveform = decode_audio(path)?;
    log::info!(
        "Loaded audio: {} ({} samples, {} Hz)",
        path.display(),
        waveform.len(),
        waveform.sample_rate()
    );

    let start = Instant::now();
    let spectrogram = engine.transform(&waveform, config)?;
    let processing_time_ms = start.elapsed().as_secs_f32() * 1000.0;
    log::info!(
        "Generated spectrogram {:?} for {} in {:.1} ms",
        spectrogram.shape(),
        source_id,
        processing_time_ms
    );

    let record = store.persist(&source_id, &spectrogram)?;
    let metadata = SpectrogramMetadata::new(
        waveform.sample_rate(),
        waveform.len(),
        processing_time_ms,
        config.clone(),
    );

    Ok(GeneratedArtifact { record, metadata })
}

/// Process many clips in parallel
///
/// Returns one result per input, in input order. A failing clip is logged and
/// does not stop the others.
pub fn generate_batch<S: ArtifactStore + ?Sized>(
    paths: &[PathBuf],
    engine: &SpectralEngine,
    store: &S,
    config: &SpectralConfig,
) -> Vec<Result<GeneratedArtifact, SpectrogramError>> {
    log::info!("Generating spectrograms for {} clips", paths.len());

    paths
        .par_iter()
        .map(|path| {
            let result = generate_spectrogram(path, engine, store, config);
            if let Err(e) = &result {
                log::error!("Spectrogram generation failed for {}: {}", path.display(), e);
            }
            result
        })
        .collect()
}
