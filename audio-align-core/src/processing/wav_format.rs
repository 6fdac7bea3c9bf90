//! RIFF/WAVE `fmt ` chunk body encoding for [`WaveFormat`].
//!
//! Only the chunk body is handled here; file headers and the `data` chunk
//! belong to the WAV reader/writer that owns the file.
//!
//! Layout:
//! ```text
//! [0-1]    format tag
//! [2-3]    channels
//! [4-7]    samples per second
//! [8-11]   average bytes per second
//! [12-13]  block align
//! [14-15]  bits per sample
//! [16-17]  extra size            (only when extra bytes follow or tag != PCM)
//! [18..]   extra bytes
//! ```

use crate::models::error::{AlignError, Result};
use crate::models::wave_format::{WaveFormat, WAVE_FORMAT_PCM};

/// Size of the plain PCM `fmt ` body.
pub const PCM_FMT_SIZE: usize = 16;

/// Size of the extended `fmt ` body before the extra bytes.
pub const EXTENDED_FMT_SIZE: usize = 18;

pub fn encode_fmt_chunk(format: &WaveFormat) -> Vec<u8> {
    let extended = format.format_tag != WAVE_FORMAT_PCM || !format.extra_info.is_empty();
    let size = if extended {
        EXTENDED_FMT_SIZE + format.extra_info.len()
    } else {
        PCM_FMT_SIZE
    };

    let mut body = Vec::with_capacity(size);
    body.extend_from_slice(&format.format_tag.to_le_bytes());
    body.extend_from_slice(&format.channels.to_le_bytes());
    body.extend_from_slice(&format.samples_per_sec.to_le_bytes());
    body.extend_from_slice(&format.avg_bytes_per_sec.to_le_bytes());
    body.extend_from_slice(&format.block_align.to_le_bytes());
    body.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    if extended {
        body.extend_from_slice(&(format.extra_info.len() as u16).to_le_bytes());
        body.extend_from_slice(&format.extra_info);
    }
    body
}

pub fn decode_fmt_chunk(body: &[u8]) -> Result<WaveFormat> {
    if body.len() < PCM_FMT_SIZE {
        return Err(AlignError::InvalidFormat(format!(
            "fmt chunk too short: {} bytes",
            body.len()
        )));
    }

    let u16_at = |i: usize| u16::from_le_bytes([body[i], body[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([body[i], body[i + 1], body[i + 2], body[i + 3]]);

    let (extra_size, extra_info) = if body.len() >= EXTENDED_FMT_SIZE {
        let extra_size = u16_at(16);
        let end = EXTENDED_FMT_SIZE + extra_size as usize;
        if body.len() < end {
            return Err(AlignError::InvalidFormat(format!(
                "fmt chunk declares {} extra bytes but only {} follow",
                extra_size,
                body.len() - EXTENDED_FMT_SIZE
            )));
        }
        (extra_size, body[EXTENDED_FMT_SIZE..end].to_vec())
    } else {
        (0, Vec::new())
    };

    Ok(WaveFormat {
        format_tag: u16_at(0),
        channels: u16_at(2),
        samples_per_sec: u32_at(4),
        avg_bytes_per_sec: u32_at(8),
        block_align: u16_at(12),
        bits_per_sample: u16_at(14),
        extra_size,
        extra_info,
    })
}
