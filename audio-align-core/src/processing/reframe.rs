use chrono::{DateTime, TimeDelta, Utc};

use crate::models::audio_models::{AudioBuffer, TimestampedBuffer};
use crate::models::error::{AlignError, Result};
use crate::models::timing::TICK;
use crate::models::wave_format::WaveFormat;

/// Target frame length, in bytes or as a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSize {
    Bytes(usize),
    Duration(TimeDelta),
}

#[derive(Debug)]
struct Accumulator {
    format: WaveFormat,
    frame_bytes: usize,
    buffer: Vec<u8>,
    /// Bytes still missing before `buffer` is a full frame.
    remaining: usize,
}

impl Accumulator {
    fn new(format: WaveFormat, frame_bytes: usize) -> Self {
        Self {
            format,
            frame_bytes,
            buffer: vec![0; frame_bytes],
            remaining: frame_bytes,
        }
    }

    fn filled(&self) -> usize {
        self.frame_bytes - self.remaining
    }
}

#[derive(Debug)]
enum ReframeState {
    Uninitialized,
    Accumulating(Accumulator),
}

/// Re-chunks timestamped audio of any length into fixed-size frames.
///
/// The frame size is fixed on construction either in bytes or as a duration;
/// the other is derived from the first buffer's format. Each frame is stamped
/// with the originating time of its last byte, and stamps are forced to be
/// strictly increasing so a backwards clock step upstream cannot reorder
/// frames.
///
/// A trailing partial frame is only released by [`flush`](Self::flush).
/// When the input format changes, the partial frame in the old format is
/// dropped and framing restarts in the new one.
#[derive(Debug)]
pub struct Reframer {
    target: FrameSize,
    state: ReframeState,
    last_emitted: Option<DateTime<Utc>>,
    last_input: Option<DateTime<Utc>>,
}

impl Reframer {
    pub fn new(target: FrameSize) -> Result<Self> {
        match target {
            FrameSize::Bytes(0) => {
                return Err(AlignError::ConfigurationFailed(
                    "frame size must be positive".into(),
                ))
            }
            FrameSize::Duration(d) if d <= TimeDelta::zero() => {
                return Err(AlignError::ConfigurationFailed(
                    "frame duration must be positive".into(),
                ))
            }
            _ => {}
        }

        Ok(Self {
            target,
            state: ReframeState::Uninitialized,
            last_emitted: None,
            last_input: None,
        })
    }

    pub fn with_frame_bytes(bytes: usize) -> Result<Self> {
        Self::new(FrameSize::Bytes(bytes))
    }

    pub fn with_frame_duration(duration: TimeDelta) -> Result<Self> {
        Self::new(FrameSize::Duration(duration))
    }

    /// Frame length in bytes, once known.
    pub fn frame_size_bytes(&self) -> Option<usize> {
        match (&self.state, self.target) {
            (ReframeState::Accumulating(acc), _) => Some(acc.frame_bytes),
            (ReframeState::Uninitialized, FrameSize::Bytes(bytes)) => Some(bytes),
            (ReframeState::Uninitialized, FrameSize::Duration(_)) => None,
        }
    }

    /// Frame duration, once known.
    pub fn frame_duration(&self) -> Option<TimeDelta> {
        match (&self.state, self.target) {
            (ReframeState::Accumulating(acc), _) => Some(acc.format.duration_of(acc.frame_bytes)),
            (ReframeState::Uninitialized, FrameSize::Duration(d)) => Some(d),
            (ReframeState::Uninitialized, FrameSize::Bytes(_)) => None,
        }
    }

    /// Bytes held in the current, incomplete frame.
    pub fn pending_bytes(&self) -> usize {
        match &self.state {
            ReframeState::Accumulating(acc) => acc.filled(),
            ReframeState::Uninitialized => 0,
        }
    }

    /// Consume one buffer stamped at `originating_time` and return every
    /// frame it completes, in order.
    pub fn feed(&mut self, originating_time: DateTime<Utc>, buffer: AudioBuffer) -> Result<Vec<TimestampedBuffer>> {
        let needs_init = match &self.state {
            ReframeState::Uninitialized => true,
            ReframeState::Accumulating(acc) if acc.format != buffer.format => {
                log::warn!(
                    "reframer input format changed from {:?} to {:?}; dropping {} pending bytes",
                    acc.format,
                    buffer.format,
                    acc.filled()
                );
                true
            }
            ReframeState::Accumulating(_) => false,
        };
        if needs_init {
            self.state = ReframeState::Accumulating(self.initialize(&buffer.format)?);
        }
        let ReframeState::Accumulating(acc) = &mut self.state else {
            return Ok(Vec::new());
        };

        let mut frames = Vec::new();
        let mut consumed = 0;
        while consumed < buffer.len() {
            let offset = acc.filled();
            let to_copy = acc.remaining.min(buffer.len() - consumed);
            acc.buffer[offset..offset + to_copy].copy_from_slice(&buffer.data[consumed..consumed + to_copy]);
            consumed += to_copy;
            acc.remaining -= to_copy;

            if acc.remaining == 0 {
                let unconsumed = acc.format.duration_of(buffer.len() - consumed);
                let time = next_monotonic(originating_time - unconsumed, self.last_emitted);
                self.last_emitted = Some(time);

                let fresh = vec![0; acc.frame_bytes];
                let data = std::mem::replace(&mut acc.buffer, fresh);
                acc.remaining = acc.frame_bytes;

                log::trace!("reframer emitted {} bytes at {}", data.len(), time);
                frames.push(TimestampedBuffer::new(time, AudioBuffer::new(data, acc.format.clone())));
            }
        }

        self.last_input = Some(originating_time);
        Ok(frames)
    }

    /// Release the incomplete trailing frame, if any, and start over empty.
    ///
    /// The frame is shorter than the configured size and is stamped with the
    /// last input time.
    pub fn flush(&mut self) -> Option<TimestampedBuffer> {
        let ReframeState::Accumulating(acc) = &mut self.state else {
            return None;
        };
        let filled = acc.filled();
        let input_time = self.last_input?;
        if filled == 0 {
            return None;
        }

        let mut data = std::mem::replace(&mut acc.buffer, vec![0; acc.frame_bytes]);
        data.truncate(filled);
        acc.remaining = acc.frame_bytes;

        let time = next_monotonic(input_time, self.last_emitted);
        self.last_emitted = Some(time);
        Some(TimestampedBuffer::new(time, AudioBuffer::new(data, acc.format.clone())))
    }

    fn initialize(&self, format: &WaveFormat) -> Result<Accumulator> {
        format.validate()?;
        let frame_bytes = match self.target {
            FrameSize::Bytes(bytes) => bytes,
            FrameSize::Duration(duration) => format.byte_count_covering(duration),
        };
        if frame_bytes == 0 {
            return Err(AlignError::InvalidFormat(format!(
                "frame target {:?} is empty for format {:?}",
                self.target, format
            )));
        }

        log::debug!(
            "reframer initialized: {} bytes per frame ({} ms)",
            frame_bytes,
            format.duration_of(frame_bytes).num_milliseconds()
        );
        Ok(Accumulator::new(format.clone(), frame_bytes))
    }
}

/// `candidate`, or one tick past `last` if that would not move time forward.
fn next_monotonic(candidate: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match last {
        Some(last) if candidate <= last => last + TICK,
        _ => candidate,
    }
}
