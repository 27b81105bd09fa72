//! Shared stream cursor
//!
//! The main loop switches streams while the mixer pulls from them on its own
//! schedule. Both sides go through one `parking_lot::Mutex`, so a switch
//! fully completes before the next fill observes the new file.

use super::WavStream;
use parking_lot::Mutex;
use std::sync::Arc;

/// Owner-side view of the active stream session
#[derive(Clone, Default)]
pub struct SharedStream {
    inner: Arc<Mutex<Option<WavStream>>>,
}

impl SharedStream {
    /// Create an empty slot (no stream open)
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `stream` as the active session, dropping the previous file
    pub fn replace(&self, stream: Option<WavStream>) {
        *self.inner.lock() = stream;
    }

    /// Drop the active session; fills return silence afterwards
    pub fn close(&self) {
        self.inner.lock().take();
    }

    /// Whether a session is active
    pub fn is_open(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Loop count of the active session, if any
    pub fn loop_count(&self) -> Option<u64> {
        self.inner.lock().as_ref().map(WavStream::loop_count)
    }

    /// Callback handle for the mixer
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Pull-callback side handed to the mixer
#[derive(Clone)]
pub struct StreamHandle {
    inner: Arc<Mutex<Option<WavStream>>>,
}

impl StreamHandle {
    /// Fill `dest` from the active stream.
    ///
    /// Returns the number of words written. No session, or an I/O error,
    /// yields 0 and the mixer retries on its next pull.
    pub fn fill(&self, dest: &mut [u16]) -> usize {
        let mut guard = self.inner.lock();
        let Some(stream) = guard.as_mut() else {
            return 0;
        };

        match stream.fill_buffer(dest) {
            Ok(words) => words,
            Err(e) => {
                tracing::warn!("stream fill failed: {e}");
                0
            }
        }
    }
}
