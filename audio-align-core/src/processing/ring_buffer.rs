/// Fixed-capacity circular byte buffer.
///
/// Not synchronized. Wrap in [`BoundedAudioChannel`](crate::BoundedAudioChannel)
/// for cross-thread producer/consumer use.
///
/// Overflow behavior of [`write`](Self::write): drops the oldest unread bytes
/// and counts them in [`bytes_overrun`](Self::bytes_overrun).
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<u8>,
    write_index: usize,
    read_index: usize,
    available: usize,
    bytes_written: u64,
    bytes_read: u64,
    bytes_overrun: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            bytes_written: 0,
            bytes_read: 0,
            bytes_overrun: 0,
        }
    }

    /// Write all of `data`, overwriting the oldest unread bytes if it does not fit.
    ///
    /// If `data` is larger than capacity, only its last `capacity` bytes are kept.
    /// Returns `data.len()`.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let capacity = self.capacity();
        if data.is_empty() || capacity == 0 {
            return 0;
        }

        let overflow = (self.available + data.len()).saturating_sub(capacity);

        // Only the tail can survive
        let retained = if data.len() > capacity {
            &data[data.len() - capacity..]
        } else {
            data
        };
        self.copy_in(retained);

        if overflow > 0 {
            self.read_index = self.write_index;
            self.available = capacity;
            self.bytes_overrun += overflow as u64;
        } else {
            self.available += data.len();
        }
        self.bytes_written += data.len() as u64;
        data.len()
    }

    /// Write as much of `data` as fits in the free space. Never overwrites.
    pub fn write_available(&mut self, data: &[u8]) -> usize {
        let to_write = data.len().min(self.free());
        if to_write == 0 {
            return 0;
        }

        self.copy_in(&data[..to_write]);
        self.available += to_write;
        self.bytes_written += to_write as u64;
        to_write
    }

    /// Read and remove up to `out.len()` bytes into `out`.
    ///
    /// Returns the number of bytes copied.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let to_read = out.len().min(self.available);
        if to_read == 0 {
            return 0;
        }

        let capacity = self.capacity();
        let first = to_read.min(capacity - self.read_index);
        out[..first].copy_from_slice(&self.buffer[self.read_index..self.read_index + first]);
        if first < to_read {
            out[first..to_read].copy_from_slice(&self.buffer[..to_read - first]);
        }

        self.read_index = (self.read_index + to_read) % capacity;
        self.available -= to_read;
        self.bytes_read += to_read as u64;
        to_read
    }

    /// Copy `data` (at most `capacity` bytes) at the write cursor and advance it.
    fn copy_in(&mut self, data: &[u8]) {
        let capacity = self.capacity();
        let first = data.len().min(capacity - self.write_index);
        self.buffer[self.write_index..self.write_index + first].copy_from_slice(&data[..first]);
        if first < data.len() {
            self.buffer[..data.len() - first].copy_from_slice(&data[first..]);
        }
        self.write_index = (self.write_index + data.len()) % capacity;
    }

    /// Number of bytes currently available for reading.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Room left before a write would overrun.
    pub fn free(&self) -> usize {
        self.capacity() - self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn is_full(&self) -> bool {
        self.available == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn bytes_overrun(&self) -> u64 {
        self.bytes_overrun
    }

    /// Reset the cursors to an empty state. Counters are kept.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
    }
}
