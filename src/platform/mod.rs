//! Platform services
//!
//! The game core never touches hardware directly. Video, input, sound and
//! the packaged filesystem are reached through the traits below, one call
//! per responsibility, so a console runtime and the host platform can both
//! drive the same [`GameSession`](crate::game::GameSession).

use crate::streaming::{AssetReader, StreamHandle, StreamParams};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::io;

bitflags! {
    /// Button and touch edges for one frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Keys: u16 {
        /// A button
        const A = 1 << 0;
        /// B button
        const B = 1 << 1;
        /// Select button
        const SELECT = 1 << 2;
        /// Start button
        const START = 1 << 3;
        /// D-pad right
        const RIGHT = 1 << 4;
        /// D-pad left
        const LEFT = 1 << 5;
        /// D-pad up
        const UP = 1 << 6;
        /// D-pad down
        const DOWN = 1 << 7;
        /// Right shoulder
        const R = 1 << 8;
        /// Left shoulder
        const L = 1 << 9;
        /// X button
        const X = 1 << 10;
        /// Y button
        const Y = 1 << 11;
        /// Stylus touched down
        const TOUCH = 1 << 12;
    }
}

/// Touch-screen sample in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Horizontal pixel
    pub x: u16,
    /// Vertical pixel
    pub y: u16,
}

/// Input polled once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    /// Keys that went down this frame
    pub keys_down: Keys,
    /// Touch sample, meaningful when `keys_down` contains [`Keys::TOUCH`]
    pub touch: Option<TouchPoint>,
}

impl InputState {
    /// A frame with only a touch-down at `(x, y)`
    pub fn touch(x: u16, y: u16) -> Self {
        InputState {
            keys_down: Keys::TOUCH,
            touch: Some(TouchPoint { x, y }),
        }
    }

    /// A frame with `keys` pressed and no touch
    pub fn keys(keys: Keys) -> Self {
        InputState {
            keys_down: keys,
            touch: None,
        }
    }

    /// Whether `key` went down this frame
    pub fn pressed(&self, key: Keys) -> bool {
        self.keys_down.contains(key)
    }
}

/// Full-screen images the game swaps between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenImage {
    /// Title image shown while playing
    Splash,
    /// Victory image
    Congrat,
}

/// One-shot effects from the sound bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// A target was hit
    Hit,
    /// Every target is gone
    Congrat,
}

/// Video surface: background, sprite engine, vertical blank
pub trait Display {
    /// Block until the next vertical blank
    fn wait_for_vblank(&mut self);

    /// Latch background scroll/affine state
    fn update_background(&mut self);

    /// Flush pending sprite attributes to the engine
    fn commit_sprites(&mut self);

    /// Place sprite `index` at `(x, y)` (32x32, 256 colours, shared graphics)
    fn set_sprite(&mut self, index: usize, x: i32, y: i32);

    /// Hide sprite `index`
    fn clear_sprite(&mut self, index: usize);

    /// Upload tiles, map and palette of `image` to the background
    fn show_image(&mut self, image: ScreenImage);
}

/// Buttons and touch screen
pub trait Input {
    /// Poll edges for this frame
    fn scan(&mut self) -> InputState;
}

/// Sound mixer: one pull-driven stream plus one-shot effects
pub trait Mixer {
    /// Initialise the mixer with the sound bank blob
    fn init(&mut self, soundbank: Vec<u8>);

    /// Open (or replace) the stream session; the mixer calls
    /// [`StreamHandle::fill`] whenever it needs more words
    fn open_stream(&mut self, params: StreamParams, source: StreamHandle);

    /// Stop pulling from the stream
    fn close_stream(&mut self);

    /// Make `effect` playable at `volume` (0-255)
    fn load_effect(&mut self, effect: SoundEffect, volume: u8);

    /// Start `effect`
    fn play_effect(&mut self, effect: SoundEffect);

    /// Per-frame service tick, called right after the vertical blank
    fn frame(&mut self) {}
}

/// Packaged read-only filesystem
pub trait AssetFs {
    /// Make the filesystem available
    fn mount(&mut self) -> io::Result<()>;

    /// Open asset `name` for reading
    fn open(&self, name: &str) -> io::Result<Box<dyn AssetReader>>;
}

/// Everything a session needs from the platform
pub trait Platform {
    /// Video surface
    type Display: Display;
    /// Input surface
    type Input: Input;
    /// Sound mixer
    type Mixer: Mixer;
    /// Asset filesystem
    type Assets: AssetFs;

    /// Borrow every service at once
    fn split(&mut self) -> Services<'_, Self::Display, Self::Input, Self::Mixer, Self::Assets>;
}

/// Simultaneous mutable access to each platform service
pub struct Services<'a, D, I, M, A> {
    /// Video surface
    pub display: &'a mut D,
    /// Input surface
    pub input: &'a mut I,
    /// Sound mixer
    pub mixer: &'a mut M,
    /// Asset filesystem
    pub assets: &'a mut A,
}
