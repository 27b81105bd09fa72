//! Ring buffer between the pull callback and the output device
//!
//! - Producer: the mixer pump, pulling words from the stream callback
//! - Consumer: the output device (or the headless drain)
//!
//! Memory consumption is fixed at capacity * 2 bytes regardless of how long
//! the stream plays.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Error type for ring buffer operations
#[derive(Debug, Clone)]
pub struct RingBufferError(pub String);

impl std::fmt::Display for RingBufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RingBufferError {}

impl From<RingBufferError> for crate::WhackError {
    fn from(e: RingBufferError) -> Self {
        crate::WhackError::AudioDeviceError(e.0)
    }
}

/// Ring buffer of 16-bit sample words
///
/// One producer and one consumer. Storage sits behind a mutex; positions are
/// atomics so the fill level can be read without taking the lock.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Mutex<Vec<u16>>,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
    /// Power of two
    capacity: usize,
    mask: usize,
}

impl RingBuffer {
    /// Largest accepted capacity (64 MB of words)
    const MAX_CAPACITY: usize = 64 * 1024 * 1024 / std::mem::size_of::<u16>();

    /// Create a new ring buffer
    /// Capacity is rounded up to the next power of 2
    ///
    /// # Errors
    ///
    /// Returns an error if the requested capacity is 0 or exceeds 64 MB.
    pub fn new(requested_capacity: usize) -> Result<Self, RingBufferError> {
        if requested_capacity == 0 {
            return Err(RingBufferError(
                "Ring buffer capacity must be greater than 0".into(),
            ));
        }

        let capacity = requested_capacity.next_power_of_two();
        if capacity > Self::MAX_CAPACITY {
            return Err(RingBufferError(format!(
                "Ring buffer capacity {capacity} exceeds maximum safe size {}",
                Self::MAX_CAPACITY
            )));
        }

        Ok(RingBuffer {
            buffer: Mutex::new(vec![0; capacity]),
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
            capacity,
            mask: capacity - 1,
        })
    }

    /// Capacity in words
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Words available to read
    #[cfg(test)]
    pub fn available_read(&self) -> usize {
        // Read position first: both only grow, so the later write load can
        // never fall behind it
        let read = self.read_pos.load(Ordering::Acquire);
        let write = self.write_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Words that can be written before the buffer is full
    #[cfg(test)]
    pub fn available_write(&self) -> usize {
        self.capacity - 1 - self.available_read()
    }

    /// Write words (producer). Returns how many fit.
    pub fn write(&self, words: &[u16]) -> usize {
        let mut buf = self.buffer.lock();

        let write_pos = self.write_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        let available = self.capacity - 1 - write_pos.wrapping_sub(read_pos);

        let to_write = words.len().min(available);
        if to_write == 0 {
            return 0;
        }

        let write_idx = write_pos & self.mask;
        if write_idx + to_write <= self.capacity {
            buf[write_idx..write_idx + to_write].copy_from_slice(&words[..to_write]);
        } else {
            let first_part = self.capacity - write_idx;
            buf[write_idx..].copy_from_slice(&words[..first_part]);
            buf[..to_write - first_part].copy_from_slice(&words[first_part..to_write]);
        }

        drop(buf);
        self.write_pos
            .store(write_pos.wrapping_add(to_write), Ordering::Release);

        to_write
    }

    /// Read words (consumer). Returns how many were available.
    pub fn read(&self, dest: &mut [u16]) -> usize {
        let buf = self.buffer.lock();

        let write_pos = self.write_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        let available = write_pos.wrapping_sub(read_pos);

        let to_read = dest.len().min(available);
        if to_read == 0 {
            return 0;
        }

        let read_idx = read_pos & self.mask;
        if read_idx + to_read <= self.capacity {
            dest[..to_read].copy_from_slice(&buf[read_idx..read_idx + to_read]);
        } else {
            let first_part = self.capacity - read_idx;
            dest[..first_part].copy_from_slice(&buf[read_idx..]);
            dest[first_part..to_read].copy_from_slice(&buf[..to_read - first_part]);
        }

        drop(buf);
        self.read_pos
            .store(read_pos.wrapping_add(to_read), Ordering::Release);

        to_read
    }

    /// Discard everything pending
    pub fn flush(&self) {
        let _buf = self.buffer.lock();
        let write_pos = self.write_pos.load(Ordering::Acquire);
        self.read_pos.store(write_pos, Ordering::Release);
    }

    /// Fill level (0.0 to 1.0)
    #[cfg(test)]
    pub fn fill_percentage(&self) -> f32 {
        (self.available_read() as f32) / (self.capacity as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_power_of_two() {
        let rb = RingBuffer::new(1000).unwrap();
        assert_eq!(rb.capacity(), 1024);
        assert_eq!(rb.available_write(), 1023);
    }

    #[test]
    fn test_write_and_read() {
        let rb = RingBuffer::new(16).unwrap();
        assert_eq!(rb.write(&[1, 2, 3, 4]), 4);
        assert_eq!(rb.available_read(), 4);

        let mut dest = [0u16; 4];
        assert_eq!(rb.read(&mut dest), 4);
        assert_eq!(dest, [1, 2, 3, 4]);
    }

    #[test]
    fn test_ring_buffer_wrap() {
        let rb = RingBuffer::new(16).unwrap();
        assert_eq!(rb.write(&[1; 10]), 10);

        let mut buf = [0u16; 5];
        assert_eq!(rb.read(&mut buf), 5);

        // Crosses the end of storage
        let data: Vec<u16> = (20..30).collect();
        assert_eq!(rb.write(&data), 10);

        let mut out = [0u16; 15];
        assert_eq!(rb.read(&mut out), 15);
        assert_eq!(&out[..5], &[1; 5]);
        assert_eq!(&out[5..], &data[..]);
    }

    #[test]
    fn test_write_stops_when_full() {
        let rb = RingBuffer::new(8).unwrap();
        assert_eq!(rb.write(&[3; 20]), 7);
        assert_eq!(rb.write(&[3; 1]), 0);
        assert_eq!(rb.available_write(), 0);
    }

    #[test]
    fn test_flush() {
        let rb = RingBuffer::new(16).unwrap();
        rb.write(&[1; 8]);
        rb.flush();
        assert_eq!(rb.available_read(), 0);
        assert_eq!(rb.fill_percentage(), 0.0);
    }

    #[test]
    fn test_fill_level_bounded_while_draining() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let rb = Arc::new(RingBuffer::new(64).unwrap());
        let done = Arc::new(AtomicBool::new(false));

        let producer = {
            let rb = Arc::clone(&rb);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    rb.write(&[1; 16]);
                }
            })
        };
        let consumer = {
            let rb = Arc::clone(&rb);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut dest = [0u16; 16];
                while !done.load(Ordering::Relaxed) {
                    rb.read(&mut dest);
                }
            })
        };

        for _ in 0..100_000 {
            assert!(rb.available_read() < rb.capacity());
        }
        done.store(true, Ordering::Relaxed);
        producer.join().unwrap();
        consumer.join().unwrap();
    }

    #[test]
    fn test_zero_capacity_error() {
        let result = RingBuffer::new(0);
        assert!(result.unwrap_err().to_string().contains("greater than 0"));
    }
}
