//! Analysis window

use std::f32::consts::PI;

/// Periodic Hann window of length `size`
///
/// `w[n] = 0.5 * (1 - cos(2πn / size))`, the DFT-even form used for
/// spectral analysis. A length-1 window is `[1.0]`.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / size as f32).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_endpoints_and_peak() {
        let w = hann_window(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-7);
        // Periodic window peaks at size / 2 and is symmetric around it
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[1] - w[7]).abs() < 1e-6);
        assert!((w[3] - w[5]).abs() < 1e-6);
    }

    #[test]
    fn test_hann_single_sample() {
        assert_eq!(hann_window(1), vec![1.0]);
    }
}
