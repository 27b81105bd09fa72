//! Audio output through rodio
//!
//! Drains the mixer's ring buffer into the default output device. Underruns
//! play silence so the device thread never stalls.

use crate::streaming::RingBuffer;
use crate::{Result, WhackError};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Words read from the ring per batch
const BATCH_WORDS: usize = 1024;

/// rodio source over the ring buffer
struct RingSource {
    ring: Arc<RingBuffer>,
    channels: u16,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
    batch: Vec<u16>,
    batch_pos: usize,
}

impl Iterator for RingSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        if self.batch_pos >= self.batch.len() {
            let read = self.ring.read(&mut self.batch);
            self.batch[read..].fill(0);
            self.batch_pos = 0;
        }

        let word = self.batch[self.batch_pos];
        self.batch_pos += 1;
        Some(word as i16)
    }
}

impl Source for RingSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Default output device fed from a ring buffer
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default device and start draining `ring`
    pub fn new(sample_rate: u32, channels: u16, ring: Arc<RingBuffer>) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            WhackError::AudioDeviceError(format!("Failed to create audio stream: {e}"))
        })?;
        let sink = Sink::try_new(&handle).map_err(|e| {
            WhackError::AudioDeviceError(format!("Failed to create audio sink: {e}"))
        })?;

        let finished = Arc::new(AtomicBool::new(false));
        sink.append(RingSource {
            ring,
            channels,
            sample_rate,
            finished: Arc::clone(&finished),
            batch: vec![0; BATCH_WORDS],
            batch_pos: BATCH_WORDS,
        });
        tracing::debug!(sample_rate, channels, "audio output started");

        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }

    /// Stop playback
    pub fn finish(self) {
        self.finished.store(true, Ordering::Relaxed);
        self.sink.stop();
    }
}
