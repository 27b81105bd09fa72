//! VBL (Vertical Blanking) clock
//!
//! Host stand-in for the handheld's display refresh. Counts frames, can pace
//! the loop to real time, and splits a stream's word rate into per-frame
//! budgets without drifting.

use std::time::{Duration, Instant};

/// Handheld display refresh rate in Hz
pub const REFRESH_HZ: f64 = 59.8261;

/// Timing configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Frames per second
    pub refresh_hz: f64,
    /// Sleep until each frame's deadline instead of returning at once
    pub realtime: bool,
}

impl TimingConfig {
    /// Real-time pacing at the handheld rate
    pub fn realtime() -> Self {
        TimingConfig {
            refresh_hz: REFRESH_HZ,
            realtime: true,
        }
    }

    /// Timing for a host run: paced when asked for, and always paced when the
    /// stream is audible so the output device drains at the rate it is fed
    pub fn for_output(realtime: bool, audible: bool) -> Self {
        if realtime || audible {
            Self::realtime()
        } else {
            Self::default()
        }
    }

    /// Length of one frame
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_hz)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            refresh_hz: REFRESH_HZ,
            realtime: false,
        }
    }
}

/// VBL synchronization manager
#[derive(Debug, Clone)]
pub struct VblSync {
    config: TimingConfig,
    vbl_count: u64,
    /// Deadline of the next frame when pacing
    next_deadline: Option<Instant>,
    /// Fractional words carried between frames
    word_remainder: f64,
}

impl VblSync {
    /// Create a new VBL clock
    pub fn new(config: TimingConfig) -> Self {
        VblSync {
            config,
            vbl_count: 0,
            next_deadline: None,
            word_remainder: 0.0,
        }
    }

    /// Wait for the next vertical blank
    pub fn wait(&mut self) {
        if self.config.realtime {
            let now = Instant::now();
            let deadline = self.next_deadline.unwrap_or(now);
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            // Re-anchor after a long stall instead of bursting to catch up
            let floor = now
                .checked_sub(self.config.frame_duration())
                .unwrap_or(now);
            let base = deadline.max(floor);
            self.next_deadline = Some(base + self.config.frame_duration());
        }
        self.vbl_count += 1;
    }

    /// Words due this frame for a stream consuming `words_per_second`
    pub fn words_for_frame(&mut self, words_per_second: usize) -> usize {
        let exact = words_per_second as f64 / self.config.refresh_hz + self.word_remainder;
        let whole = exact.floor();
        self.word_remainder = exact - whole;
        whole as usize
    }

    /// Total vertical blanks so far
    pub fn vbl_count(&self) -> u64 {
        self.vbl_count
    }

    /// Reset counters
    pub fn reset(&mut self) {
        self.vbl_count = 0;
        self.next_deadline = None;
        self.word_remainder = 0.0;
    }

    /// Switch to `config`, keeping the frame count
    pub fn set_timing(&mut self, config: TimingConfig) {
        self.config = config;
        self.next_deadline = None;
    }
}

impl Default for VblSync {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}
