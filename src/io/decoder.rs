//! Audio decoding using Symphonia
//!
//! Decodes any container/codec Symphonia supports into a mono
//! [`WaveformBuffer`] at the file's native sample rate. Multi-channel audio is
//! averaged to mono.
//!
//! Symphonia has no Opus decoder, so Opus tracks (the usual payload of
//! browser `.webm` recordings and of `.opus` files) fail with
//! `DecodeFailure`. Transcode those to a supported codec first.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL, CODEC_TYPE_OPUS};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::sample_buffer::WaveformBuffer;
use crate::error::SpectrogramError;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Decode an audio file to a mono waveform
///
/// # Arguments
///
/// * `path` - Path to audio file; its extension is used as a format hint
///
/// # Returns
///
/// Mono samples in [-1.0, 1.0] with the file's native sample rate
///
/// # Errors
///
/// Returns `SpectrogramError::DecodeFailure` if the file cannot be opened, has
/// no decodable audio track (Opus included), or yields no samples.
pub fn decode_audio(path: impl AsRef<Path>) -> Result<WaveformBuffer, SpectrogramError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path).map_err(|e| {
        SpectrogramError::DecodeFailure(format!("Cannot open {}: {}", path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| {
            SpectrogramError::DecodeFailure(format!(
                "Unrecognised format for {}: {}",
                path.display(),
                e
            ))
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            SpectrogramError::DecodeFailure(format!(
                "No supported audio track in {}",
                path.display()
            ))
        })?;

    if track.codec_params.codec == CODEC_TYPE_OPUS {
        return Err(SpectrogramError::DecodeFailure(format!(
            "Opus audio in {} is not supported; transcode to FLAC, WAV, MP3, AAC or Vorbis",
            path.display()
        )));
    }

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| {
            SpectrogramError::DecodeFailure(format!(
                "Unsupported codec in {}: {}",
                path.display(),
                e
            ))
        })?;

    let mut mono: Vec<f32> = Vec::new();
    let mut convert: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(SpectrogramError::DecodeFailure(format!(
                    "Failed reading packets from {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), msg);
                continue;
            }
            Err(e) => {
                return Err(SpectrogramError::DecodeFailure(format!(
                    "Decoder error in {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let spec = *decoded.spec();
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
        }
        let channels = spec.channels.count();

        // Capacity is counted in interleaved samples
        let required = decoded.capacity() * channels;
        if convert.as_ref().map_or(true, |buf| buf.capacity() < required) {
            convert = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = convert.as_mut() {
            buf.copy_interleaved_ref(decoded);
            let frame_samples = downmix_interleaved(buf.samples(), channels)?;
            mono.extend_from_slice(&frame_samples);
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| {
        SpectrogramError::DecodeFailure(format!("Unknown sample rate in {}", path.display()))
    })?;

    if mono.is_empty() {
        return Err(SpectrogramError::DecodeFailure(format!(
            "No audio samples decoded from {}",
            path.display()
        )));
    }

    log::debug!(
        "Decoded {} samples at {} Hz from {}",
        mono.len(),
        sample_rate,
        path.display()
    );

    WaveformBuffer::new(mono, sample_rate)
        .map_err(|e| SpectrogramError::DecodeFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_decode_failure() {
        let result = decode_audio("/nonexistent/clip.wav");
        assert!(matches!(result, Err(SpectrogramError::DecodeFailure(_))));
    }

    #[test]
    fn test_garbage_file_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        let result = decode_audio(&path);
        assert!(matches!(result, Err(SpectrogramError::DecodeFailure(_))));
    }

    /// Ogg page CRC (polynomial 0x04c11db7, no reflection)
    fn ogg_crc(data: &[u8]) -> u32 {
        let mut crc = 0u32;
        for &b in data {
            crc ^= (b as u32) << 24;
            for _ in 0..8 {
                crc = if crc & 0x8000_0000 != 0 {
                    (crc << 1) ^ 0x04c1_1db7
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    /// One Ogg page carrying a single packet shorter than 255 bytes
    fn ogg_page(header_type: u8, granule: u64, sequence: u32, packet: &[u8]) -> Vec<u8> {
        let mut page = b"OggS".to_vec();
        page.push(0);
        page.push(header_type);
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&0x1234u32.to_le_bytes());
        page.extend_from_slice(&sequence.to_le_bytes());
        page.extend_from_slice(&[0; 4]);
        page.push(1);
        page.push(packet.len() as u8);
        page.extend_from_slice(packet);
        let crc = ogg_crc(&page);
        page[22..26].copy_from_slice(&crc.to_le_bytes());
        page
    }

    /// Minimal mono Ogg Opus stream: identification, comments, one frame
    fn ogg_opus_bytes() -> Vec<u8> {
        let mut head = b"OpusHead".to_vec();
        head.push(1); // version
        head.push(1); // channels
        head.extend_from_slice(&312u16.to_le_bytes()); // pre-skip
        head.extend_from_slice(&48000u32.to_le_bytes());
        head.extend_from_slice(&0i16.to_le_bytes());
        head.push(0); // mapping family

        let mut tags = b"OpusTags".to_vec();
        tags.extend_from_slice(&4u32.to_le_bytes());
        tags.extend_from_slice(b"test");
        tags.extend_from_slice(&0u32.to_le_bytes());

        // 20 ms CELT frame, TOC only
        let frame = [0xF8u8, 0xFF, 0xFE];

        let mut bytes = ogg_page(0x02, 0, 0, &head);
        bytes.extend(ogg_page(0x00, 0, 1, &tags));
        bytes.extend(ogg_page(0x04, 960 + 312, 2, &frame));
        bytes
    }

    #[test]
    fn test_opus_track_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.opus");
        std::fs::write(&path, ogg_opus_bytes()).unwrap();

        let result = decode_audio(&path);
        assert!(
            matches!(result, Err(SpectrogramError::DecodeFailure(_))),
            "{:?}",
            result
        );
    }
}
