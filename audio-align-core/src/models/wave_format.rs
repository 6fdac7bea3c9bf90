use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::error::{AlignError, Result};
use super::timing::{from_ticks, to_ticks, TICKS_PER_SECOND};

pub const WAVE_FORMAT_PCM: u16 = 1;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

/// Audio format descriptor.
///
/// Field layout mirrors the RIFF/WAVE `fmt ` chunk so WAV readers and writers
/// can hand it over unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extra_size: u16,
    #[serde(default)]
    pub extra_info: Vec<u8>,
}

impl WaveFormat {
    /// Integer PCM with derived byte rate and block alignment.
    pub fn pcm(samples_per_sec: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self::with_tag(WAVE_FORMAT_PCM, samples_per_sec, bits_per_sample, channels)
    }

    /// 32-bit IEEE float.
    pub fn ieee_float(samples_per_sec: u32, channels: u16) -> Self {
        Self::with_tag(WAVE_FORMAT_IEEE_FLOAT, samples_per_sec, 32, channels)
    }

    /// 16 kHz, mono, 16-bit PCM.
    pub fn pcm_16khz_mono_16bit() -> Self {
        Self::pcm(16_000, 16, 1)
    }

    fn with_tag(format_tag: u16, samples_per_sec: u32, bits_per_sample: u16, channels: u16) -> Self {
        let block_align = channels * bits_per_sample.div_ceil(8);
        Self {
            format_tag,
            channels,
            samples_per_sec,
            avg_bytes_per_sec: samples_per_sec * block_align as u32,
            block_align,
            bits_per_sample,
            extra_size: 0,
            extra_info: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.avg_bytes_per_sec == 0 {
            return Err(AlignError::InvalidFormat("average bytes per second must be positive".into()));
        }
        if self.block_align == 0 {
            return Err(AlignError::InvalidFormat("block align must be positive".into()));
        }
        if self.extra_size as usize != self.extra_info.len() {
            return Err(AlignError::InvalidFormat(format!(
                "extra size {} does not match {} extra bytes",
                self.extra_size,
                self.extra_info.len()
            )));
        }
        Ok(())
    }

    /// Playback time of `bytes` bytes, truncated to whole ticks.
    ///
    /// Zero when the byte rate is unknown.
    pub fn duration_of(&self, bytes: usize) -> TimeDelta {
        if self.avg_bytes_per_sec == 0 {
            return TimeDelta::zero();
        }
        let ticks = bytes as i128 * TICKS_PER_SECOND as i128 / self.avg_bytes_per_sec as i128;
        from_ticks(ticks.min(i64::MAX as i128) as i64)
    }

    /// Whole blocks of audio that fit in `duration`, in bytes.
    ///
    /// Non-positive durations map to zero.
    pub fn byte_count_for(&self, duration: TimeDelta) -> usize {
        let ticks = to_ticks(duration);
        if ticks <= 0 || self.avg_bytes_per_sec == 0 {
            return 0;
        }
        let bytes = ticks as i128 * self.avg_bytes_per_sec as i128 / TICKS_PER_SECOND as i128;
        let bytes = bytes.min(usize::MAX as i128) as usize;
        bytes - bytes % self.block_size()
    }

    /// Like [`byte_count_for`](Self::byte_count_for) but keeps the sign of `duration`.
    pub fn signed_byte_count_for(&self, duration: TimeDelta) -> i64 {
        if duration < TimeDelta::zero() {
            -(self.byte_count_for(-duration) as i64)
        } else {
            self.byte_count_for(duration) as i64
        }
    }

    /// Smallest block-aligned byte count covering at least `duration`.
    pub fn byte_count_covering(&self, duration: TimeDelta) -> usize {
        let ticks = to_ticks(duration);
        if ticks <= 0 || self.avg_bytes_per_sec == 0 {
            return 0;
        }
        let numerator = ticks as i128 * self.avg_bytes_per_sec as i128;
        let bytes = (numerator + TICKS_PER_SECOND as i128 - 1) / TICKS_PER_SECOND as i128;
        let bytes = bytes.min(usize::MAX as i128) as usize;
        bytes.div_ceil(self.block_size()) * self.block_size()
    }

    fn block_size(&self) -> usize {
        self.block_align.max(1) as usize
    }
}

impl Default for WaveFormat {
    fn default() -> Self {
        Self::pcm_16khz_mono_16bit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_derives_rates() {
        let format = WaveFormat::pcm(48_000, 16, 2);
        assert_eq!(format.block_align, 4);
        assert_eq!(format.avg_bytes_per_sec, 192_000);
        assert_eq!(format.format_tag, WAVE_FORMAT_PCM);
        assert!(format.validate().is_ok());
    }

    #[test]
    fn ieee_float_is_four_bytes_per_sample() {
        let format = WaveFormat::ieee_float(16_000, 1);
        assert_eq!(format.block_align, 4);
        assert_eq!(format.bits_per_sample, 32);
        assert_eq!(format.avg_bytes_per_sec, 64_000);
    }

    #[test]
    fn duration_of_bytes() {
        let format = WaveFormat::pcm_16khz_mono_16bit();
        assert_eq!(format.duration_of(32_000), TimeDelta::seconds(1));
        assert_eq!(format.duration_of(320), TimeDelta::milliseconds(10));
        assert_eq!(format.duration_of(0), TimeDelta::zero());
    }

    #[test]
    fn zero_rate_has_no_duration() {
        let mut format = WaveFormat::pcm_16khz_mono_16bit();
        format.avg_bytes_per_sec = 0;
        assert_eq!(format.duration_of(1000), TimeDelta::zero());
        assert_eq!(format.byte_count_for(TimeDelta::seconds(1)), 0);
        assert!(matches!(format.validate(), Err(AlignError::InvalidFormat(_))));
    }

    #[test]
    fn byte_count_is_block_aligned() {
        let format = WaveFormat::pcm(1_000, 16, 2); // 4000 B/s, 4-byte blocks
        // 1.5 ms = 6 bytes -> 4
        assert_eq!(format.byte_count_for(TimeDelta::microseconds(1500)), 4);
        assert_eq!(format.byte_count_covering(TimeDelta::microseconds(1500)), 8);
        assert_eq!(format.byte_count_for(TimeDelta::milliseconds(-5)), 0);
        assert_eq!(format.signed_byte_count_for(TimeDelta::milliseconds(-5)), -20);
    }

    #[test]
    fn mismatched_extra_size_is_rejected() {
        let mut format = WaveFormat::pcm_16khz_mono_16bit();
        format.extra_size = 2;
        assert!(format.validate().is_err());
    }
}
