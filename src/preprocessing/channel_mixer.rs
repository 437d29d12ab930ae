//! Channel mixing utilities (multi-channel to mono conversion)

use crate::error::SpectrogramError;

/// Average interleaved multi-channel samples down to mono
///
/// # Arguments
///
/// * `interleaved` - Samples in frame order (`L R L R ...` for stereo)
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// One sample per frame, the arithmetic mean of its channels
///
/// # Errors
///
/// Returns `SpectrogramError::InvalidConfiguration` if `channels` is 0 or the
/// sample count is not a multiple of `channels`.
pub fn downmix_interleaved(
    interleaved: &[f32],
    channels: usize,
) -> Result<Vec<f32>, SpectrogramError> {
    if channels == 0 {
        return Err(SpectrogramError::InvalidConfiguration(
            "Channel count must be > 0".to_string(),
        ));
    }

    if interleaved.len() % channels != 0 {
        return Err(SpectrogramError::InvalidConfiguration(format!(
            "{} samples do not divide into {} channels",
            interleaved.len(),
            channels
        )));
    }

    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    log::debug!(
        "Downmixing {} frames of {} channels to mono",
        interleaved.len() / channels,
        channels
    );

    let scale = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}
