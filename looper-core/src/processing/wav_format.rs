//! In-memory WAV encoding for recording exports.
//!
//! Produces a standard 44-byte RIFF header followed by little-endian sample
//! data, either 32-bit IEEE float (format code 3) or 16-bit PCM (format
//! code 1).

use crate::models::config::ExportFormat;
use crate::models::error::LooperError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;

/// Generate a 44-byte WAV RIFF header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (format chunk size)
/// [20-21]  format code (1 = PCM, 3 = IEEE float)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(
    format_code: u16,
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = channels * bit_depth / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&format_code.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit PCM, clamping out-of-range values.
pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let int16_value = (clamped * i16::MAX as f32) as i16;
        data.extend_from_slice(&int16_value.to_le_bytes());
    }
    data
}

/// Encode interleaved samples as a complete WAV file.
pub fn encode_wav(
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
    format: ExportFormat,
) -> Result<Vec<u8>, LooperError> {
    if channels == 0 {
        return Err(LooperError::EncodingFailed("channel count must be positive".into()));
    }
    if sample_rate == 0 {
        return Err(LooperError::EncodingFailed("sample rate must be positive".into()));
    }

    let (format_code, bit_depth) = match format {
        ExportFormat::Float32 => (FORMAT_IEEE_FLOAT, 32u16),
        ExportFormat::Pcm16 => (FORMAT_PCM, 16u16),
    };

    let data_size = samples.len() * bit_depth as usize / 8;
    let data_size = u32::try_from(data_size)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            LooperError::EncodingFailed(format!("{} bytes exceed the WAV size limit", data_size))
        })?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);
    bytes.extend_from_slice(&generate_wav_header(
        format_code,
        sample_rate,
        bit_depth,
        channels,
        data_size,
    ));

    match format {
        ExportFormat::Float32 => {
            for sample in samples {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
        ExportFormat::Pcm16 => bytes.extend_from_slice(&convert_to_int16_pcm(samples)),
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(FORMAT_PCM, 48000, 16, 2, 0);
        assert_eq!(header.len(), 44);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_48khz_stereo_16bit() {
        let header = generate_wav_header(FORMAT_PCM, 48000, 16, 2, 9600);

        assert_eq!(read_u16(&header, 20), 1);
        assert_eq!(read_u16(&header, 22), 2);
        assert_eq!(read_u32(&header, 24), 48000);
        assert_eq!(read_u32(&header, 28), 192000); // 48000 * 2 * 16/8
        assert_eq!(read_u16(&header, 32), 4);
        assert_eq!(read_u16(&header, 34), 16);
        assert_eq!(read_u32(&header, 40), 9600);
        assert_eq!(read_u32(&header, 4), 36 + 9600);
    }

    #[test]
    fn float_export_keeps_samples_bit_exact() {
        let samples = [0.5f32, -0.25, 1.5];
        let bytes = encode_wav(&samples, 1, 44100, ExportFormat::Float32).unwrap();

        assert_eq!(bytes.len(), 44 + 12);
        assert_eq!(read_u16(&bytes, 20), 3);
        assert_eq!(read_u16(&bytes, 34), 32);
        assert_eq!(read_u32(&bytes, 40), 12);

        let third = f32::from_le_bytes([bytes[52], bytes[53], bytes[54], bytes[55]]);
        assert_eq!(third, 1.5);
    }

    #[test]
    fn pcm16_export_clamps() {
        let bytes = encode_wav(&[2.0, -3.0, 0.0], 1, 48000, ExportFormat::Pcm16).unwrap();

        assert_eq!(bytes.len(), 44 + 6);
        assert_eq!(read_u16(&bytes, 20), 1);
        assert_eq!(i16::from_le_bytes([bytes[44], bytes[45]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), -i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[48], bytes[49]]), 0);
    }

    #[test]
    fn empty_recording_is_header_only() {
        let bytes = encode_wav(&[], 2, 48000, ExportFormat::Float32).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE);
        assert_eq!(read_u32(&bytes, 40), 0);
    }

    #[test]
    fn rejects_zero_rate() {
        assert!(matches!(
            encode_wav(&[0.0], 1, 0, ExportFormat::Float32),
            Err(LooperError::EncodingFailed(_))
        ));
    }
}
