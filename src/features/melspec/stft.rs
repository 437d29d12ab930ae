//! Windowed power spectrum of one frame

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::framing::fill_frame;
use super::window::hann_window;

/// Reusable per-transform FFT state
///
/// Holds the planned FFT, the window and scratch buffers so each frame is
/// analysed without allocating.
pub struct StftAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    frame: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl StftAnalyzer {
    /// Plan a forward FFT of length `fft_size` (must be > 0)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            fft,
            window: hann_window(fft_size),
            frame: vec![0.0; fft_size],
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Number of non-negative frequency bins (`fft_size / 2 + 1`)
    pub fn n_bins(&self) -> usize {
        self.window.len() / 2 + 1
    }

    /// Power spectrum `|X[k]|²` of frame `index`, written into `power`
    ///
    /// `power` must hold `n_bins()` values.
    pub fn power_frame(&mut self, samples: &[f32], index: usize, hop_size: usize, power: &mut [f32]) {
        fill_frame(samples, index, hop_size, &mut self.frame);

        for ((dst, &x), &w) in self
            .buffer
            .iter_mut()
            .zip(self.frame.iter())
            .zip(self.window.iter())
        {
            *dst = Complex::new(x * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (p, c) in power.iter_mut().zip(self.buffer.iter()) {
            *p = c.norm_sqr();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_has_zero_power() {
        let mut stft = StftAnalyzer::new(64);
        let mut power = vec![1.0f32; stft.n_bins()];
        stft.power_frame(&[0.0; 64], 0, 16, &mut power);
        assert!(power.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_bin_centered_sine_peaks_at_its_bin() {
        let n = 256;
        let bin = 10;
        let samples: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / n as f32).sin())
            .collect();

        let mut stft = StftAnalyzer::new(n);
        let mut power = vec![0.0f32; stft.n_bins()];
        stft.power_frame(&samples, 0, n, &mut power);

        let peak = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
    }
}
