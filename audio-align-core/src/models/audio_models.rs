use chrono::{DateTime, TimeDelta, Utc};

use super::wave_format::WaveFormat;

/// A chunk of raw audio bytes in a known format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    pub data: Vec<u8>,
    pub format: WaveFormat,
}

impl AudioBuffer {
    pub fn new(data: Vec<u8>, format: WaveFormat) -> Self {
        Self { data, format }
    }

    /// Silent buffer of `len` bytes.
    pub fn zeroed(len: usize, format: WaveFormat) -> Self {
        Self { data: vec![0; len], format }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration(&self) -> TimeDelta {
        self.format.duration_of(self.data.len())
    }
}

/// An audio buffer tagged with the originating time of its last byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedBuffer {
    pub originating_time: DateTime<Utc>,
    pub buffer: AudioBuffer,
}

impl TimestampedBuffer {
    pub fn new(originating_time: DateTime<Utc>, buffer: AudioBuffer) -> Self {
        Self { originating_time, buffer }
    }

    /// Originating time of the first byte.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.originating_time - self.buffer.duration()
    }

    pub fn duration(&self) -> TimeDelta {
        self.buffer.duration()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Snapshot of a bounded channel's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStatistics {
    pub capacity: usize,
    pub bytes_available: usize,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub bytes_overrun: u64,
    pub closed: bool,
}
