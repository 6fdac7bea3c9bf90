use std::io;
use std::sync::Arc;

use super::channel::BoundedAudioChannel;

/// Fixed-size block reads and writes over a [`BoundedAudioChannel`].
///
/// Each call loops on the channel until the requested count is met or the
/// channel closes, so codec front ends that expect exact-length blocks can sit
/// directly on a capture channel. A short result always means closure.
///
/// Reads rely on the channel's blocking mode; over a non-blocking channel a
/// read returns whatever was buffered.
#[derive(Debug, Clone)]
pub struct ExactCountStream {
    channel: Arc<BoundedAudioChannel>,
}

impl ExactCountStream {
    pub fn new(channel: Arc<BoundedAudioChannel>) -> Self {
        Self { channel }
    }

    /// Fill `buf` completely unless the channel closes first.
    ///
    /// Returns the number of bytes read.
    pub fn read_exact_into(&self, buf: &mut [u8]) -> usize {
        let mut total = 0;
        while total < buf.len() {
            let n = self.channel.read(&mut buf[total..]);
            if n == 0 {
                break;
            }
            total += n;
        }
        total
    }

    /// Read exactly `count` bytes, or fewer if the channel closes.
    pub fn read_exact_vec(&self, count: usize) -> Vec<u8> {
        let mut out = vec![0; count];
        let n = self.read_exact_into(&mut out);
        out.truncate(n);
        out
    }

    /// Write all of `data` without overrunning, unless the channel closes first.
    ///
    /// Returns the number of bytes written.
    pub fn write_exact(&self, data: &[u8]) -> usize {
        let mut total = 0;
        while total < data.len() {
            let n = self.channel.write_blocking(&data[total..]);
            if n == 0 {
                break;
            }
            total += n;
        }
        total
    }

    pub fn close(&self) {
        self.channel.close();
    }

    pub fn channel(&self) -> &Arc<BoundedAudioChannel> {
        &self.channel
    }
}

/// Short reads signal end of stream.
impl io::Read for ExactCountStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_exact_into(buf))
    }
}

impl io::Write for ExactCountStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.write_exact(buf) {
            0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "audio channel closed")),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn stream(capacity: usize) -> ExactCountStream {
        ExactCountStream::new(Arc::new(BoundedAudioChannel::new(capacity, true).unwrap()))
    }

    #[test]
    fn read_collects_across_writes() {
        let stream = stream(4);
        let producer = {
            let stream = stream.clone();
            thread::spawn(move || {
                for chunk in [[1u8, 2], [3, 4], [5, 6]] {
                    assert_eq!(stream.write_exact(&chunk), 2);
                    thread::sleep(Duration::from_millis(5));
                }
            })
        };

        assert_eq!(stream.read_exact_vec(6), vec![1, 2, 3, 4, 5, 6]);
        producer.join().unwrap();
    }

    #[test]
    fn write_larger_than_capacity_completes_with_reader() {
        let stream = stream(3);
        let data: Vec<u8> = (0..20).collect();

        let consumer = {
            let stream = stream.clone();
            thread::spawn(move || stream.read_exact_vec(20))
        };

        assert_eq!(stream.write_exact(&data), 20);
        assert_eq!(consumer.join().unwrap(), data);
        assert_eq!(stream.channel().statistics().bytes_overrun, 0);
    }

    #[test]
    fn read_returns_partial_count_on_close() {
        let stream = stream(8);
        let reader = {
            let stream = stream.clone();
            thread::spawn(move || stream.read_exact_vec(5))
        };

        stream.write_exact(&[1, 2, 3]);
        while stream.channel().statistics().bytes_read < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        stream.close();

        assert_eq!(reader.join().unwrap(), vec![1, 2, 3]);
        assert!(stream.read_exact_vec(5).is_empty());
    }

    #[test]
    fn bytes_buffered_at_close_are_not_returned() {
        let stream = stream(8);
        stream.write_exact(&[1, 2, 3]);
        stream.close();

        assert!(stream.read_exact_vec(3).is_empty());
    }

    #[test]
    fn write_returns_partial_count_on_close() {
        let stream = stream(2);
        let writer = {
            let stream = stream.clone();
            thread::spawn(move || stream.write_exact(&[1, 2, 3, 4]))
        };

        thread::sleep(Duration::from_millis(20));
        stream.close();

        assert_eq!(writer.join().unwrap(), 2);
    }

    #[test]
    fn io_traits() {
        let mut stream = stream(16);
        stream.write_all(b"hello").unwrap();

        let mut word = [0; 5];
        stream.read_exact(&mut word).unwrap();
        assert_eq!(&word, b"hello");

        stream.close();
        let mut out = Vec::new();
        assert_eq!(stream.read_to_end(&mut out).unwrap(), 0);

        let err = stream.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
