//! Raster rendering of a spectrogram
//!
//! Produces an RGB image: the spectrogram in the magma colormap (time left to
//! right, lowest mel band at the bottom), tick marks on the time axis (one per
//! second) and mel-frequency axis, and a dB color scale on the right with a
//! tick every 10 dB.

use std::io::Write;

use crate::analysis::result::Spectrogram;
use crate::config::StoreOptions;
use crate::features::melspec::filterbank::hz_to_mel;

/// Space left of the plot for frequency ticks
const LEFT_MARGIN: usize = 8;
/// Space below the plot for time ticks
const BOTTOM_MARGIN: usize = 8;
/// Space above the plot
const TOP_MARGIN: usize = 4;
/// Gap between plot and color scale
const BAR_GAP: usize = 6;
/// Width of the color scale
const BAR_WIDTH: usize = 12;
/// Space right of the color scale for dB ticks
const RIGHT_MARGIN: usize = 8;
/// Tick length in pixels
const TICK_LEN: usize = 5;

/// Largest width or height a PNG can declare
const MAX_DIMENSION: usize = i32::MAX as usize;

/// Frequencies marked on the mel axis
const FREQ_TICKS_HZ: [f64; 6] = [128.0, 512.0, 1024.0, 2048.0, 4096.0, 8192.0];

const BACKGROUND: [u8; 3] = [255, 255, 255];
const INK: [u8; 3] = [0, 0, 0];

/// Anchor colors of the magma colormap at evenly spaced positions
const MAGMA: [[u8; 3]; 9] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

/// Map `t` in [0, 1] to a magma RGB color
pub fn magma(t: f32) -> [u8; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (MAGMA.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(MAGMA.len() - 2);
    let frac = scaled - lo as f32;

    let mut rgb = [0u8; 3];
    for (c, out) in rgb.iter_mut().enumerate() {
        let a = MAGMA[lo][c] as f32;
        let b = MAGMA[lo + 1][c] as f32;
        *out = (a + (b - a) * frac).round() as u8;
    }
    rgb
}

/// RGB8 image held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major RGB triples, top row first
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Caller guarantees `width * height * 3` fits in `usize`
    fn new(width: usize, height: usize) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            pixels.extend_from_slice(&BACKGROUND);
        }
        Self {
            width: width as u32,
            height: height as u32,
            pixels,
        }
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        let (w, h) = (self.width as usize, self.height as usize);
        (x < w && y < h).then(|| (y * w + x) * 3)
    }

    fn put(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i..i + 3].copy_from_slice(&rgb);
        }
    }

    /// Color at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.offset(x as usize, y as usize)
            .map(|i| [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    fn hline(&mut self, x0: usize, x1: usize, y: usize) {
        for x in x0..x1 {
            self.put(x, y, INK);
        }
    }

    fn vline(&mut self, x: usize, y0: usize, y1: usize) {
        for y in y0..y1 {
            self.put(x, y, INK);
        }
    }
}

/// Plot and full image dimensions, or `None` if they cannot be encoded
fn layout(
    spectrogram: &Spectrogram,
    ppf: usize,
    ppb: usize,
) -> Option<(usize, usize, usize, usize)> {
    let plot_w = spectrogram.num_frames().checked_mul(ppf)?;
    let plot_h = spectrogram.mel_bands().checked_mul(ppb)?;
    let width = plot_w.checked_add(LEFT_MARGIN + BAR_GAP + BAR_WIDTH + RIGHT_MARGIN)?;
    let height = plot_h.checked_add(TOP_MARGIN + BOTTOM_MARGIN)?;
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return None;
    }
    width.checked_mul(height)?.checked_mul(3)?;
    Some((plot_w, plot_h, width, height))
}

/// Render a spectrogram to an in-memory raster
///
/// # Errors
///
/// Fails if the image would exceed PNG's dimension limit or the address
/// space at the configured pixel scale.
pub fn render_raster(
    spectrogram: &Spectrogram,
    options: &StoreOptions,
) -> Result<RasterImage, png::EncodingError> {
    let ppf = options.pixels_per_frame.max(1) as usize;
    let ppb = options.pixels_per_band.max(1) as usize;
    let (plot_w, plot_h, width, height) = layout(spectrogram, ppf, ppb).ok_or_else(|| {
        png::EncodingError::from(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "image for shape {:?} at {}x{} px per cell is too large",
                spectrogram.shape(),
                ppf,
                ppb
            ),
        ))
    })?;
    let mut image = RasterImage::new(width, height);

    let vmax = spectrogram.max_value();
    let vmin = spectrogram.min_value();
    let range = vmax - vmin;
    let normalize = |v: f32| if range > 0.0 { (v - vmin) / range } else { 0.5 };

    let plot_x = LEFT_MARGIN;
    let plot_bottom = TOP_MARGIN + plot_h;

    // Spectrogram body, band 0 at the bottom
    for band in 0..spectrogram.mel_bands() {
        let row_top = plot_bottom - (band + 1) * ppb;
        for frame in 0..spectrogram.num_frames() {
            let value = spectrogram.get(band, frame).unwrap_or(vmin);
            let color = magma(normalize(value));
            let col_left = plot_x + frame * ppf;
            for dy in 0..ppb {
                for dx in 0..ppf {
                    image.put(col_left + dx, row_top + dy, color);
                }
            }
        }
    }

    // Axes
    image.vline(plot_x - 1, TOP_MARGIN, plot_bottom + 1);
    image.hline(plot_x - 1, plot_x + plot_w, plot_bottom);

    // Time ticks, one per second
    let frames_per_second = spectrogram.sample_rate() as f32 / spectrogram.hop_size() as f32;
    let mut second = 1usize;
    loop {
        let x = (second as f32 * frames_per_second * ppf as f32).round() as usize;
        if x >= plot_w {
            break;
        }
        image.vline(plot_x + x, plot_bottom + 1, plot_bottom + 1 + TICK_LEN);
        second += 1;
    }

    // Frequency ticks, placed on the mel scale the bands are spaced on
    let nyquist = spectrogram.sample_rate() as f64 / 2.0;
    let mel_step = hz_to_mel(nyquist) / (spectrogram.mel_bands() + 1) as f64;
    for &hz in FREQ_TICKS_HZ.iter().filter(|&&hz| hz < nyquist) {
        let band_pos = hz_to_mel(hz) / mel_step - 1.0;
        if band_pos < 0.0 {
            continue;
        }
        let offset = ((band_pos + 0.5) * ppb as f64).round() as usize;
        if offset >= plot_h {
            continue;
        }
        let y = plot_bottom - 1 - offset;
        image.hline(plot_x - 1 - TICK_LEN.min(plot_x - 1), plot_x - 1, y);
    }

    // Color scale: vmax at the top, vmin at the bottom
    let bar_x = plot_x + plot_w + BAR_GAP;
    for dy in 0..plot_h {
        let t = if plot_h > 1 {
            1.0 - dy as f32 / (plot_h - 1) as f32
        } else {
            0.5
        };
        let color = magma(t);
        for dx in 0..BAR_WIDTH {
            image.put(bar_x + dx, TOP_MARGIN + dy, color);
        }
    }

    if range > 0.0 && plot_h > 1 {
        let mut tick_db = (vmax / 10.0).floor() * 10.0;
        while tick_db >= vmin {
            let t = (tick_db - vmin) / range;
            let y = TOP_MARGIN + ((1.0 - t) * (plot_h - 1) as f32).round() as usize;
            image.hline(bar_x + BAR_WIDTH, bar_x + BAR_WIDTH + TICK_LEN, y);
            tick_db -= 10.0;
        }
    }

    Ok(image)
}

/// Render a spectrogram and encode it as PNG
pub fn write_png<W: Write>(
    spectrogram: &Spectrogram,
    options: &StoreOptions,
    writer: W,
) -> Result<(), png::EncodingError> {
    let image = render_raster(spectrogram, options)?;
    log::debug!(
        "Encoding {}x{} spectrogram image",
        image.width,
        image.height
    );

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.pixels)?;
    png_writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(mel_bands: usize, num_frames: usize) -> Spectrogram {
        let data = (0..mel_bands * num_frames)
            .map(|i| -((i % num_frames) as f32))
            .collect();
        Spectrogram::from_parts(data, mel_bands, num_frames, 16000, 512).unwrap()
    }

    #[test]
    fn test_magma_endpoints() {
        assert_eq!(magma(0.0), MAGMA[0]);
        assert_eq!(magma(1.0), MAGMA[8]);
        assert_eq!(magma(f32::NAN), MAGMA[0]);
        assert_eq!(magma(2.0), MAGMA[8]);
    }

    #[test]
    fn test_raster_dimensions() {
        let spec = ramp(10, 40);
        let options = StoreOptions {
            render_image: true,
            pixels_per_band: 3,
            pixels_per_frame: 2,
        };
        let image = render_raster(&spec, &options).unwrap();
        assert_eq!(
            image.width as usize,
            LEFT_MARGIN + 80 + BAR_GAP + BAR_WIDTH + RIGHT_MARGIN
        );
        assert_eq!(image.height as usize, TOP_MARGIN + 30 + BOTTOM_MARGIN);
        assert_eq!(
            image.pixels.len(),
            image.width as usize * image.height as usize * 3
        );
    }

    #[test]
    fn test_loudest_frame_is_brightest() {
        // Frame 0 holds 0 dB, the last frame the minimum
        let spec = ramp(4, 8);
        let options = StoreOptions {
            render_image: true,
            pixels_per_band: 1,
            pixels_per_frame: 1,
        };
        let image = render_raster(&spec, &options).unwrap();
        let y = (TOP_MARGIN + 1) as u32;
        let x = LEFT_MARGIN as u32;
        assert_eq!(image.pixel(x, y), Some(magma(1.0)));
        assert_eq!(image.pixel(x + 7, y), Some(magma(0.0)));
    }

    #[test]
    fn test_png_signature() {
        let spec = ramp(8, 16);
        let mut bytes = Vec::new();
        write_png(&spec, &StoreOptions::default(), &mut bytes).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        // 3 frames at u32::MAX px each is wider than a PNG may be
        let spec = ramp(2, 3);
        let options = StoreOptions {
            render_image: true,
            pixels_per_band: 1,
            pixels_per_frame: u32::MAX,
        };
        assert!(render_raster(&spec, &options).is_err());

        let mut bytes = Vec::new();
        assert!(write_png(&spec, &options, &mut bytes).is_err());
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_layout_limits() {
        let spec = ramp(128, 28);
        assert!(layout(&spec, 2, 2).is_some());
        assert!(layout(&spec, usize::MAX, 1).is_none());
        assert!(layout(&spec, 1, MAX_DIMENSION).is_none());
    }
}
