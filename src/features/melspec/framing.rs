//! Frame layout over a sample buffer

/// Number of analysis frames for a buffer
///
/// `floor((len - fft_size) / hop_size) + 1` when the buffer holds at least one
/// full window; a shorter non-empty buffer yields a single zero-padded frame.
/// Callers guarantee `hop_size > 0`.
pub fn frame_count(len: usize, fft_size: usize, hop_size: usize) -> usize {
    if len < fft_size {
        1
    } else {
        (len - fft_size) / hop_size + 1
    }
}

/// Copy frame `index` into `out`, zero-padding past the end of `samples`
///
/// `out.len()` is the frame length.
pub fn fill_frame(samples: &[f32], index: usize, hop_size: usize, out: &mut [f32]) {
    let start = (index * hop_size).min(samples.len());
    let end = (start + out.len()).min(samples.len());
    let available = end - start;

    out[..available].copy_from_slice(&samples[start..end]);
    out[available..].fill(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_formula() {
        assert_eq!(frame_count(16000, 2048, 512), 28);
        assert_eq!(frame_count(2048, 2048, 512), 1);
        assert_eq!(frame_count(2048 + 511, 2048, 512), 1);
        assert_eq!(frame_count(2048 + 512, 2048, 512), 2);
    }

    #[test]
    fn test_short_input_is_one_frame() {
        assert_eq!(frame_count(100, 2048, 512), 1);
        assert_eq!(frame_count(1, 2048, 512), 1);
    }

    #[test]
    fn test_fill_frame_zero_pads() {
        let samples = [1.0, 2.0, 3.0];
        let mut out = [9.0f32; 5];
        fill_frame(&samples, 0, 2, &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fill_frame_hop_offset() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut out = [0.0f32; 4];
        fill_frame(&samples, 2, 3, &mut out);
        assert_eq!(out, [6.0, 7.0, 8.0, 9.0]);
    }
}
