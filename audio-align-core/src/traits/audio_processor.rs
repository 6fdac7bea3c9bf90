use std::sync::Arc;

use crate::models::audio_models::TimestampedBuffer;
use crate::models::error::Result;
use crate::processing::reframe::Reframer;
use crate::processing::streamline::Streamliner;

/// Callback invoked with each timestamped block a pump produces.
pub type BufferCallback = Arc<dyn Fn(TimestampedBuffer) + Send + Sync + 'static>;

/// A synchronous, single-threaded pipeline stage.
///
/// The caller must deliver messages in order and never concurrently; stages
/// keep their state between calls and do no locking of their own.
pub trait AudioProcessor: Send {
    /// Consume one message and return whatever it releases.
    fn process(&mut self, message: TimestampedBuffer) -> Result<Vec<TimestampedBuffer>>;

    /// Release anything held back at end of stream.
    fn flush(&mut self) -> Vec<TimestampedBuffer>;

    fn name(&self) -> &str;
}

impl AudioProcessor for Reframer {
    fn process(&mut self, message: TimestampedBuffer) -> Result<Vec<TimestampedBuffer>> {
        self.feed(message.originating_time, message.buffer)
    }

    fn flush(&mut self) -> Vec<TimestampedBuffer> {
        Reframer::flush(self).into_iter().collect()
    }

    fn name(&self) -> &str {
        "reframe"
    }
}

impl AudioProcessor for Streamliner {
    fn process(&mut self, message: TimestampedBuffer) -> Result<Vec<TimestampedBuffer>> {
        Ok(self.feed(message.originating_time, message.buffer).into_iter().collect())
    }

    fn flush(&mut self) -> Vec<TimestampedBuffer> {
        Streamliner::flush(self).into_iter().collect()
    }

    fn name(&self) -> &str {
        self.strategy().as_str()
    }
}

/// Stages run back to back: every output of one stage is fed to the next.
#[derive(Default)]
pub struct StageChain {
    stages: Vec<Box<dyn AudioProcessor>>,
}

impl StageChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl AudioProcessor + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn push(&mut self, stage: Box<dyn AudioProcessor>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn run_from(&mut self, start: usize, mut messages: Vec<TimestampedBuffer>) -> Result<Vec<TimestampedBuffer>> {
        for stage in &mut self.stages[start..] {
            let mut next = Vec::new();
            for message in messages {
                next.extend(stage.process(message)?);
            }
            messages = next;
        }
        Ok(messages)
    }
}

impl AudioProcessor for StageChain {
    fn process(&mut self, message: TimestampedBuffer) -> Result<Vec<TimestampedBuffer>> {
        self.run_from(0, vec![message])
    }

    /// Flushes stages in order, pushing each stage's leftovers through the rest.
    fn flush(&mut self) -> Vec<TimestampedBuffer> {
        let mut out = Vec::new();
        for i in 0..self.stages.len() {
            let pending = self.stages[i].flush();
            match self.run_from(i + 1, pending) {
                Ok(messages) => out.extend(messages),
                Err(e) => log::error!("stage chain flush failed after {}: {}", self.stages[i].name(), e),
            }
        }
        out
    }

    fn name(&self) -> &str {
        "chain"
    }
}
