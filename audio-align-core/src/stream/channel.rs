use parking_lot::{Condvar, Mutex};

use crate::models::audio_models::ChannelStatistics;
use crate::models::error::{AlignError, Result};
use crate::processing::ring_buffer::RingBuffer;

struct ChannelState {
    ring: RingBuffer,
    closed: bool,
    /// Set while the producer is overwriting unread data; cleared by the next read.
    overrunning: bool,
}

/// Bounded byte channel between a capture thread and a consumer.
///
/// One mutex and one condition variable guard the ring buffer and the closed
/// flag. Two write modes are offered:
///
/// - [`write`](Self::write) never blocks and overwrites the oldest unread
///   bytes when the consumer falls behind. Lost bytes are counted, not reported.
/// - [`write_blocking`](Self::write_blocking) waits for room and never overwrites.
///
/// [`close`](Self::close) wakes every waiter. After close, reads report no
/// more data and writes are no-ops; both return 0. Bytes still buffered at
/// close are abandoned.
pub struct BoundedAudioChannel {
    state: Mutex<ChannelState>,
    signal: Condvar,
    blocking_reads: bool,
}

impl BoundedAudioChannel {
    pub fn new(capacity: usize, blocking_reads: bool) -> Result<Self> {
        if capacity == 0 {
            return Err(AlignError::ConfigurationFailed(
                "channel capacity must be positive".into(),
            ));
        }
        Ok(Self {
            state: Mutex::new(ChannelState {
                ring: RingBuffer::new(capacity),
                closed: false,
                overrunning: false,
            }),
            signal: Condvar::new(),
            blocking_reads,
        })
    }

    /// Write all of `data`, overwriting the oldest unread bytes if needed.
    ///
    /// Never blocks. Returns `data.len()`, or 0 once the channel is closed.
    pub fn write(&self, data: &[u8]) -> usize {
        let written = {
            let mut state = self.state.lock();
            if state.closed {
                log::debug!("dropping {} bytes written after close", data.len());
                return 0;
            }

            let overrun_before = state.ring.bytes_overrun();
            let written = state.ring.write(data);
            let lost = state.ring.bytes_overrun() - overrun_before;
            if lost > 0 && !state.overrunning {
                state.overrunning = true;
                log::warn!(
                    "audio channel overrun: consumer fell behind, {} unread bytes discarded",
                    lost
                );
            }
            written
        };

        if written > 0 {
            self.signal.notify_all();
        }
        written
    }

    /// Write up to the free space, waiting while the buffer is full.
    ///
    /// Returns the number of bytes written, which may be less than
    /// `data.len()`. Returns 0 once the channel is closed.
    pub fn write_blocking(&self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }

        let written = {
            let mut state = self.state.lock();
            while state.ring.is_full() && !state.closed {
                self.signal.wait(&mut state);
            }
            if state.closed {
                return 0;
            }
            state.ring.write_available(data)
        };

        self.signal.notify_all();
        written
    }

    /// Read up to `buf.len()` bytes into `buf`.
    ///
    /// With blocking reads enabled, waits while the channel is empty and open.
    /// Returns 0 once the channel is closed, or (non-blocking) when empty.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }

        let read = {
            let mut state = self.state.lock();
            if self.blocking_reads {
                while state.ring.is_empty() && !state.closed {
                    self.signal.wait(&mut state);
                }
            }
            if state.closed {
                return 0;
            }
            let read = state.ring.read(buf);
            if read > 0 {
                state.overrunning = false;
            }
            read
        };

        if read > 0 {
            self.signal.notify_all();
        }
        read
    }

    /// Read up to `max_count` bytes into a new vector.
    pub fn read_vec(&self, max_count: usize) -> Vec<u8> {
        let mut out = vec![0; max_count];
        let n = self.read(&mut out);
        out.truncate(n);
        out
    }

    /// Close the channel and wake all blocked readers and writers.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            log::debug!(
                "audio channel closed: {} bytes written, {} read, {} overrun",
                state.ring.bytes_written(),
                state.ring.bytes_read(),
                state.ring.bytes_overrun()
            );
        }
        self.signal.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().ring.capacity()
    }

    pub fn blocking_reads(&self) -> bool {
        self.blocking_reads
    }

    pub fn bytes_available(&self) -> usize {
        self.state.lock().ring.available()
    }

    pub fn statistics(&self) -> ChannelStatistics {
        let state = self.state.lock();
        ChannelStatistics {
            capacity: state.ring.capacity(),
            bytes_available: state.ring.available(),
            bytes_written: state.ring.bytes_written(),
            bytes_read: state.ring.bytes_read(),
            bytes_overrun: state.ring.bytes_overrun(),
            closed: state.closed,
        }
    }
}

impl std::fmt::Debug for BoundedAudioChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedAudioChannel")
            .field("statistics", &self.statistics())
            .field("blocking_reads", &self.blocking_reads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            BoundedAudioChannel::new(0, true),
            Err(AlignError::ConfigurationFailed(_))
        ));
    }

    #[test]
    fn write_then_read() {
        let channel = BoundedAudioChannel::new(10, true).unwrap();
        assert_eq!(channel.write(b"ABCD"), 4);

        assert_eq!(channel.read_vec(4), b"ABCD");
        assert_eq!(channel.bytes_available(), 0);
    }

    #[test]
    fn overrun_is_counted() {
        let channel = BoundedAudioChannel::new(10, false).unwrap();
        let data: Vec<u8> = (0..12).collect();
        assert_eq!(channel.write(&data), 12);

        let stats = channel.statistics();
        assert_eq!(stats.bytes_available, 10);
        assert_eq!(stats.bytes_overrun, 2);
        assert_eq!(stats.bytes_written, 12);
        assert_eq!(channel.read_vec(10), (2..12).collect::<Vec<u8>>());
    }

    #[test]
    fn non_blocking_read_on_empty_returns_nothing() {
        let channel = BoundedAudioChannel::new(8, false).unwrap();
        assert!(channel.read_vec(4).is_empty());
        assert!(!channel.is_closed());
    }

    #[test]
    fn write_blocking_stops_at_capacity() {
        let channel = BoundedAudioChannel::new(4, false).unwrap();
        assert_eq!(channel.write_blocking(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(channel.statistics().bytes_overrun, 0);
        assert_eq!(channel.read_vec(8), vec![1, 2, 3, 4]);
    }

    #[test]
    fn writes_after_close_are_ignored() {
        let channel = BoundedAudioChannel::new(8, true).unwrap();
        channel.write(&[1, 2]);
        channel.close();

        assert_eq!(channel.write(&[3, 4]), 0);
        assert_eq!(channel.write_blocking(&[5, 6]), 0);
        assert_eq!(channel.statistics().bytes_written, 2);

        assert!(channel.read_vec(8).is_empty());
    }

    #[test]
    fn reads_after_close_report_no_data() {
        for blocking in [true, false] {
            let channel = BoundedAudioChannel::new(8, blocking).unwrap();
            channel.write(&[1, 2, 3]);
            channel.close();

            assert!(channel.read_vec(8).is_empty());
            // abandoned, not consumed
            let stats = channel.statistics();
            assert_eq!(stats.bytes_read, 0);
            assert_eq!(stats.bytes_available, 3);
        }
    }

    #[test]
    fn close_is_idempotent() {
        let channel = BoundedAudioChannel::new(8, true).unwrap();
        channel.close();
        channel.close();
        assert!(channel.is_closed());
        assert!(channel.statistics().closed);
    }

    #[test]
    fn blocked_reader_is_woken_by_write() {
        let channel = Arc::new(BoundedAudioChannel::new(8, true).unwrap());
        let reader = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.read_vec(4))
        };

        thread::sleep(Duration::from_millis(20));
        channel.write(&[9, 8]);

        assert_eq!(reader.join().unwrap(), vec![9, 8]);
    }

    #[test]
    fn blocked_reader_is_woken_by_close() {
        let channel = Arc::new(BoundedAudioChannel::new(8, true).unwrap());
        let reader = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.read_vec(4))
        };

        thread::sleep(Duration::from_millis(20));
        channel.close();

        assert!(reader.join().unwrap().is_empty());
    }

    #[test]
    fn blocked_writer_is_woken_by_read() {
        let channel = Arc::new(BoundedAudioChannel::new(2, true).unwrap());
        channel.write(&[1, 2]);

        let writer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.write_blocking(&[3]))
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(channel.read_vec(1), vec![1]);

        assert_eq!(writer.join().unwrap(), 1);
        assert_eq!(channel.read_vec(2), vec![2, 3]);
    }

    #[test]
    fn blocked_writer_is_woken_by_close() {
        let channel = Arc::new(BoundedAudioChannel::new(2, true).unwrap());
        channel.write(&[1, 2]);

        let writer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.write_blocking(&[3]))
        };

        thread::sleep(Duration::from_millis(20));
        channel.close();

        assert_eq!(writer.join().unwrap(), 0);
    }
}
