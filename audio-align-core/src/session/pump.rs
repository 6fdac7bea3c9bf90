use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};

use crate::models::audio_models::{AudioBuffer, TimestampedBuffer};
use crate::models::error::{AlignError, Result};
use crate::models::wave_format::WaveFormat;
use crate::stream::exact::ExactCountStream;
use crate::traits::audio_processor::BufferCallback;

/// Source of originating times for captured blocks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync + 'static>;

/// Wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Consumer thread that turns a byte channel into timestamped audio blocks.
///
/// ```text
/// [capture thread] → BoundedAudioChannel → ExactCountStream → [audio-pump] → callback
/// ```
///
/// Each block is exactly `block_bytes` long and stamped when its last byte is
/// read. The thread ends when the channel closes; a trailing short block is
/// discarded.
pub struct AudioPump {
    stream: ExactCountStream,
    blocks_delivered: Arc<AtomicU64>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AudioPump {
    pub fn start(
        stream: ExactCountStream,
        format: WaveFormat,
        block_bytes: usize,
        clock: Clock,
        callback: BufferCallback,
    ) -> Result<Self> {
        format.validate()?;
        if block_bytes == 0 || block_bytes % format.block_align as usize != 0 {
            return Err(AlignError::ConfigurationFailed(format!(
                "block size {} must be a positive multiple of block align {}",
                block_bytes, format.block_align
            )));
        }

        let blocks_delivered = Arc::new(AtomicU64::new(0));
        let handle = {
            let stream = stream.clone();
            let delivered = Arc::clone(&blocks_delivered);
            thread::Builder::new()
                .name("audio-pump".into())
                .spawn(move || {
                    log::debug!("audio pump started: {} byte blocks", block_bytes);
                    loop {
                        let data = stream.read_exact_vec(block_bytes);
                        if data.len() < block_bytes {
                            if !data.is_empty() {
                                log::debug!("audio pump dropped {} trailing bytes at close", data.len());
                            }
                            break;
                        }
                        let time = clock();
                        callback(TimestampedBuffer::new(time, AudioBuffer::new(data, format.clone())));
                        delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    log::debug!("audio pump stopped after {} blocks", delivered.load(Ordering::Relaxed));
                })
                .map_err(|e| AlignError::Io(format!("failed to spawn audio pump: {}", e)))?
        };

        Ok(Self {
            stream,
            blocks_delivered,
            handle: Some(handle),
        })
    }

    pub fn blocks_delivered(&self) -> u64 {
        self.blocks_delivered.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Close the channel and wait for the pump thread to finish.
    pub fn stop(&mut self) {
        self.stream.close();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("audio pump thread panicked");
            }
        }
    }
}

impl Drop for AudioPump {
    fn drop(&mut self) {
        self.stop();
    }
}
