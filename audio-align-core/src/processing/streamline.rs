use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::models::audio_models::{AudioBuffer, TimestampedBuffer};
use crate::models::error::{AlignError, Result};
use crate::models::timing::from_millis_f64;

/// How consecutive buffers are re-timed against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamlineStrategy {
    /// Butt buffers together and advance time by their nominal duration.
    Concatenate,
    /// Insert silence into gaps and drop the older copy of overlaps.
    Pleat,
    /// Concatenate, resynchronizing once drift passes a threshold.
    Unpleat,
}

impl StreamlineStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concatenate => "concatenate",
            Self::Pleat => "pleat",
            Self::Unpleat => "unpleat",
        }
    }
}

impl fmt::Display for StreamlineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamlineStrategy {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concatenate" => Ok(Self::Concatenate),
            "pleat" => Ok(Self::Pleat),
            "unpleat" => Ok(Self::Unpleat),
            _ => Err(AlignError::UnknownStrategy(s.to_string())),
        }
    }
}

/// The two most recent inputs.
#[derive(Debug, Default)]
struct Window {
    first: Option<TimestampedBuffer>,
    last: Option<TimestampedBuffer>,
}

impl Window {
    /// Slide `message` in, returning whether both slots are now filled.
    fn push(&mut self, message: TimestampedBuffer) -> bool {
        if self.last.is_some() {
            self.first = self.last.take();
        }
        self.last = Some(message);
        self.first.is_some()
    }

    fn pair(&self) -> Option<(&TimestampedBuffer, &TimestampedBuffer)> {
        Some((self.first.as_ref()?, self.last.as_ref()?))
    }
}

#[derive(Debug)]
enum StrategyState {
    Concatenate { clock: Option<DateTime<Utc>> },
    Pleat { started: bool },
    Unpleat { clock: Option<DateTime<Utc>>, max_drift: TimeDelta },
}

/// Re-times a stream of audio buffers to absorb gaps and overlaps between
/// consecutive capture timestamps.
///
/// Every call looks at the previous (`first`) and current (`last`) input.
/// The first call, when the window first fills, also emits `first`'s audio,
/// so nothing is lost from the head of the stream. A stream of a single
/// buffer only comes out through [`flush`](Self::flush).
#[derive(Debug)]
pub struct Streamliner {
    strategy: StreamlineStrategy,
    state: StrategyState,
    window: Window,
    windows_processed: u64,
}

impl Streamliner {
    pub fn concatenate() -> Self {
        Self::with_state(StreamlineStrategy::Concatenate, StrategyState::Concatenate { clock: None })
    }

    pub fn pleat() -> Self {
        Self::with_state(StreamlineStrategy::Pleat, StrategyState::Pleat { started: false })
    }

    /// Unpleat with a drift threshold in milliseconds.
    pub fn unpleat(max_drift_ms: f64) -> Result<Self> {
        if !max_drift_ms.is_finite() || max_drift_ms < 0.0 {
            return Err(AlignError::ConfigurationFailed(format!(
                "unpleat drift threshold must be a non-negative number of milliseconds, got {}",
                max_drift_ms
            )));
        }
        Ok(Self::with_state(
            StreamlineStrategy::Unpleat,
            StrategyState::Unpleat {
                clock: None,
                max_drift: from_millis_f64(max_drift_ms),
            },
        ))
    }

    /// Build from a strategy; `max_drift_ms` is only read by Unpleat.
    pub fn new(strategy: StreamlineStrategy, max_drift_ms: f64) -> Result<Self> {
        match strategy {
            StreamlineStrategy::Concatenate => Ok(Self::concatenate()),
            StreamlineStrategy::Pleat => Ok(Self::pleat()),
            StreamlineStrategy::Unpleat => Self::unpleat(max_drift_ms),
        }
    }

    /// Build from a strategy name such as `"pleat"`.
    pub fn from_name(name: &str, max_drift_ms: f64) -> Result<Self> {
        Self::new(name.parse()?, max_drift_ms)
    }

    fn with_state(strategy: StreamlineStrategy, state: StrategyState) -> Self {
        Self {
            strategy,
            state,
            window: Window::default(),
            windows_processed: 0,
        }
    }

    pub fn strategy(&self) -> StreamlineStrategy {
        self.strategy
    }

    /// Push one buffer and return the re-timed output for this step, if any.
    pub fn feed(&mut self, originating_time: DateTime<Utc>, buffer: AudioBuffer) -> Option<TimestampedBuffer> {
        if !self.window.push(TimestampedBuffer::new(originating_time, buffer)) {
            return None;
        }
        let (first, last) = self.window.pair()?;

        let output = match &mut self.state {
            StrategyState::Concatenate { clock } => concatenate_step(clock, first, last),
            StrategyState::Pleat { started } => pleat_step(started, first, last),
            StrategyState::Unpleat { clock, max_drift } => unpleat_step(clock, *max_drift, first, last),
        };
        self.windows_processed += 1;

        if let Some(out) = &output {
            log::trace!(
                "{} emitted {} bytes at {}",
                self.strategy,
                out.len(),
                out.originating_time
            );
        }
        output
    }

    /// Release a lone buffer that never formed a window.
    pub fn flush(&mut self) -> Option<TimestampedBuffer> {
        if self.windows_processed > 0 || self.window.first.is_some() {
            return None;
        }
        self.window.last.take()
    }
}

fn concatenate_step(
    clock: &mut Option<DateTime<Utc>>,
    first: &TimestampedBuffer,
    last: &TimestampedBuffer,
) -> Option<TimestampedBuffer> {
    let format = last.buffer.format.clone();
    let (data, time) = match *clock {
        None => {
            let mut data = Vec::with_capacity(first.len() + last.len());
            data.extend_from_slice(&first.buffer.data);
            data.extend_from_slice(&last.buffer.data);
            (data, first.originating_time + last.duration())
        }
        Some(time) => (last.buffer.data.clone(), time + last.duration()),
    };
    *clock = Some(time);
    Some(TimestampedBuffer::new(time, AudioBuffer::new(data, format)))
}

fn pleat_step(started: &mut bool, first: &TimestampedBuffer, last: &TimestampedBuffer) -> Option<TimestampedBuffer> {
    let format = &last.buffer.format;
    // actual minus nominal spacing
    let delta = (last.originating_time - last.duration()) - first.originating_time;
    let is_first_call = !std::mem::replace(started, true);

    if delta == TimeDelta::zero() && !is_first_call {
        return Some(last.clone());
    }

    let head = if is_first_call { first.len() as i64 } else { 0 };
    let size = head + last.len() as i64 + format.signed_byte_count_for(delta);
    if size <= 0 {
        log::debug!("pleat dropped {} bytes at {}: no room after overlap", last.len(), last.originating_time);
        return None;
    }
    let size = size as usize;

    let mut data = vec![0; size];
    if is_first_call {
        let n = first.len().min(size);
        data[..n].copy_from_slice(&first.buffer.data[..n]);
    }
    place_at_end(&mut data, &last.buffer.data);

    Some(TimestampedBuffer::new(
        last.originating_time,
        AudioBuffer::new(data, format.clone()),
    ))
}

fn unpleat_step(
    clock: &mut Option<DateTime<Utc>>,
    max_drift: TimeDelta,
    first: &TimestampedBuffer,
    last: &TimestampedBuffer,
) -> Option<TimestampedBuffer> {
    let format = &last.buffer.format;
    let is_first_call = clock.is_none();
    let aligned = clock.unwrap_or(first.originating_time);
    let expected = aligned + last.duration();
    let drift = last.originating_time - expected;

    let (body, next_clock) = if drift > max_drift {
        // behind real time: pad the front and jump forward
        let pad = format.byte_count_for(drift);
        let mut data = vec![0; pad + last.len()];
        data[pad..].copy_from_slice(&last.buffer.data);
        (Some(data), last.originating_time)
    } else if drift < -max_drift {
        // ahead of real time: keep only the audio past the aligned clock
        let keep = format.signed_byte_count_for(last.originating_time - aligned);
        if keep <= 0 {
            (None, aligned)
        } else {
            let keep = (keep as usize).min(last.len());
            (Some(last.buffer.data[last.len() - keep..].to_vec()), last.originating_time)
        }
    } else {
        (Some(last.buffer.data.clone()), expected)
    };

    let data = match (is_first_call, body) {
        (true, body) => {
            let mut data = first.buffer.data.clone();
            data.extend(body.unwrap_or_default());
            data
        }
        (false, Some(body)) => body,
        (false, None) => {
            *clock = Some(next_clock);
            log::debug!(
                "unpleat dropped {} bytes at {}: drift {} ms",
                last.len(),
                last.originating_time,
                drift.num_milliseconds()
            );
            return None;
        }
    };

    *clock = Some(next_clock);
    Some(TimestampedBuffer::new(next_clock, AudioBuffer::new(data, format.clone())))
}

/// Copy `src` so that it ends at the end of `dst`, keeping the newest bytes if
/// `src` is longer.
fn place_at_end(dst: &mut [u8], src: &[u8]) {
    if src.len() >= dst.len() {
        dst.copy_from_slice(&src[src.len() - dst.len()..]);
    } else {
        let offset = dst.len() - src.len();
        dst[offset..].copy_from_slice(src);
    }
}
