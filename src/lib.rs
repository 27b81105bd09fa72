//! Touch-Whack: a touch-screen whack-a-mole for dual-screen handhelds
//!
//! Up to 32 animated targets wander the lower screen; the player eliminates
//! them by touch while a looping WAV stream plays as background music. When
//! every target is gone the victory screen and jingle take over.
//!
//! Platform services (sprite engine, input polling, sound mixing, packaged
//! filesystem) are reached through the traits in [`platform`], so the same
//! game core runs on a console runtime or on the bundled [`host`] platform.
//!
//! # Features
//! - 44-byte WAV header parsing and validation
//! - Pull-based looping stream fill with a seamless wrap inside one callback
//! - Fixed-capacity target arena with soft-bounce containment
//! - Nearest-only and area damage modes
//! - One-shot win transition
//!
//! # Crate feature flags
//! - `host` (default): Headless host platform (`host`)
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Validate a WAV header
//! ```no_run
//! use touch_whack::wav_parser::WavHeader;
//! let data = std::fs::read("music.wav").unwrap();
//! let header = WavHeader::parse(&data).unwrap();
//! header.check().unwrap();
//! println!("{} Hz, {:?}", header.sample_rate, header.stream_format());
//! ```
//!
//! ## Run a headless session
//! ```no_run
//! # #[cfg(feature = "host")]
//! # {
//! use touch_whack::config::GameConfig;
//! use touch_whack::game::GameSession;
//! use touch_whack::host::HostPlatform;
//! let mut platform = HostPlatform::from_dir("assets").unwrap();
//! let mut session = GameSession::boot(GameConfig::default(), &mut platform).unwrap();
//! session.run(&mut platform, Some(600)).unwrap();
//! # }
//! ```

#![warn(missing_docs)]

pub mod config; // Game configuration
pub mod game; // Session state and frame loop
#[cfg(feature = "host")]
pub mod host; // Host platform implementations
pub mod platform; // Platform service traits
pub mod streaming; // Pull-based audio streaming
pub mod targets; // Target arena and hit resolution
pub mod wav_parser; // WAV header parsing

use wav_parser::MagicTag;

/// Error types for game and streaming operations
#[derive(thiserror::Error, Debug)]
pub enum WhackError {
    /// The packaged asset filesystem could not be mounted
    #[error("Asset filesystem mount failed: {0}")]
    MountFailed(String),

    /// An asset required at startup could not be opened
    #[error("Failed to open asset '{name}': {source}")]
    AssetOpen {
        /// Asset name as requested
        name: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The WAV header bytes could not be read
    #[error("Failed to read WAV header: {0}")]
    HeaderUnreadable(String),

    /// A WAV header magic tag did not match
    #[error("WAV file header is corrupt: wrong {tag} {found:#x}")]
    CorruptHeader {
        /// First tag that failed the check
        tag: MagicTag,
        /// Value read in place of the expected tag
        found: u32,
    },

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl WhackError {
    /// Whether this error belongs to the startup-fatal class.
    ///
    /// Startup-fatal errors leave the console idling on the display tick
    /// after the diagnostic is printed; nothing retries them.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            WhackError::MountFailed(_)
                | WhackError::AssetOpen { .. }
                | WhackError::HeaderUnreadable(_)
                | WhackError::CorruptHeader { .. }
        )
    }

    /// Process exit code for errors that end the program instead of idling.
    pub fn exit_code(&self) -> i32 {
        match self {
            WhackError::MountFailed(_) => 1,
            _ => 2,
        }
    }
}

impl From<String> for WhackError {
    /// Converts a String into `WhackError::Other`.
    ///
    /// Prefer a specific variant (`ConfigError`, `AudioDeviceError`, ...) when
    /// the caller can tell what went wrong.
    fn from(msg: String) -> Self {
        WhackError::Other(msg)
    }
}

impl From<&str> for WhackError {
    /// Converts a string slice into `WhackError::Other`.
    fn from(msg: &str) -> Self {
        WhackError::Other(msg.to_string())
    }
}

/// Result type for game operations
pub type Result<T> = std::result::Result<T, WhackError>;

// Public API exports
pub use config::{GameConfig, StreamSwitchPolicy};
pub use game::{FrameOutcome, GameSession, GameState, SessionSummary};
pub use platform::{
    AssetFs, Display, Input, InputState, Keys, Mixer, Platform, ScreenImage, Services, SoundEffect,
    TouchPoint,
};
pub use streaming::{RingBuffer, SharedStream, StreamFormat, StreamHandle, StreamParams, WavStream};
pub use targets::{resolve_hit, DamageMode, Position, Slot, TargetSet, MAX_TARGETS};
pub use wav_parser::{check_header, WavHeader};

#[cfg(feature = "host")]
pub use host::HostPlatform;
