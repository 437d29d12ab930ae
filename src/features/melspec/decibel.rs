//! Power to decibel conversion
//!
//! `dB = 10·log10(max(p, amin)) − 10·log10(max(ref, amin))`, optionally
//! clamped to `top_db` below the loudest value.

use crate::config::ReferencePolicy;
use crate::error::SpectrogramError;

/// Convert a power matrix to dB in place
///
/// # Arguments
///
/// * `values` - Power values (any layout); overwritten with dB values
/// * `reference` - How the 0 dB reference is chosen
/// * `amin` - Power floor (> 0)
/// * `top_db` - Optional dynamic range clamp in dB
///
/// # Errors
///
/// Returns `SpectrogramError::NumericDomainError` if any result is not finite
/// (only reachable with infinite input power).
pub fn power_to_db_in_place(
    values: &mut [f32],
    reference: ReferencePolicy,
    amin: f32,
    top_db: Option<f32>,
) -> Result<(), SpectrogramError> {
    let reference_power = match reference {
        ReferencePolicy::ClipPeak => values.iter().copied().fold(0.0f32, f32::max),
        ReferencePolicy::Fixed(value) => value,
    };
    let reference_db = 10.0 * reference_power.max(amin).log10();

    // f32::max ignores NaN, so NaN power lands on the floor
    for v in values.iter_mut() {
        *v = 10.0 * v.max(amin).log10() - reference_db;
    }

    if let Some(top_db) = top_db {
        let max_db = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = max_db - top_db;
        for v in values.iter_mut() {
            *v = v.max(floor);
        }
    }

    if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
        return Err(SpectrogramError::NumericDomainError(format!(
            "Non-finite dB value {} at index {} (reference power {})",
            values[bad], bad, reference_power
        )));
    }

    Ok(())
}
