//! Host platform
//!
//! Runs the game on a desktop machine without any handheld hardware: a
//! headless display keeps the sprite table in memory, input comes from a
//! script, and the mixer pulls the stream once per frame into a ring buffer
//! (optionally captured to WAV, or played through `rodio` with the
//! `streaming` feature).

pub mod assets;
pub mod capture;
#[cfg(feature = "streaming")]
pub mod device;
pub mod display;
pub mod input;
pub mod mixer;
pub mod vbl;

pub use assets::{DirAssets, MemoryAssets, ASSET_PREFIX};
pub use capture::WavCapture;
pub use display::{HeadlessDisplay, SpriteAttr};
pub use input::{ScriptEvent, ScriptedInput};
pub use mixer::{HostMixer, MixerStats};
pub use vbl::{TimingConfig, VblSync, REFRESH_HZ};

use crate::platform::{AssetFs, Platform, Services};
use crate::Result;
use std::path::Path;

/// Desktop stand-in for the handheld
pub struct HostPlatform<A: AssetFs = DirAssets> {
    display: HeadlessDisplay,
    input: ScriptedInput,
    mixer: HostMixer,
    assets: A,
}

impl HostPlatform<DirAssets> {
    /// Serve assets from the directory `root`
    pub fn from_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::with_assets(DirAssets::new(root))
    }
}

impl<A: AssetFs> HostPlatform<A> {
    /// Platform over an arbitrary asset filesystem, no input, silent mixer
    pub fn with_assets(assets: A) -> Result<Self> {
        Ok(HostPlatform {
            display: HeadlessDisplay::default(),
            input: ScriptedInput::new(),
            mixer: HostMixer::new()?,
            assets,
        })
    }

    /// Replace the input script
    pub fn with_input(mut self, input: ScriptedInput) -> Self {
        self.input = input;
        self
    }

    /// Replace the mixer
    pub fn with_mixer(mut self, mixer: HostMixer) -> Self {
        self.mixer = mixer;
        self
    }

    /// Pace the display with `timing`
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.display = HeadlessDisplay::new(timing);
        self
    }

    /// Display state
    pub fn display(&self) -> &HeadlessDisplay {
        &self.display
    }

    /// Mutable display state
    pub fn display_mut(&mut self) -> &mut HeadlessDisplay {
        &mut self.display
    }

    /// Input script
    pub fn input(&self) -> &ScriptedInput {
        &self.input
    }

    /// Mutable input script
    pub fn input_mut(&mut self) -> &mut ScriptedInput {
        &mut self.input
    }

    /// Mixer state
    pub fn mixer(&self) -> &HostMixer {
        &self.mixer
    }

    /// Mutable mixer state
    pub fn mixer_mut(&mut self) -> &mut HostMixer {
        &mut self.mixer
    }

    /// Asset filesystem
    pub fn assets(&self) -> &A {
        &self.assets
    }
}

impl<A: AssetFs> Platform for HostPlatform<A> {
    type Display = HeadlessDisplay;
    type Input = ScriptedInput;
    type Mixer = HostMixer;
    type Assets = A;

    fn split(&mut self) -> Services<'_, HeadlessDisplay, ScriptedInput, HostMixer, A> {
        Services {
            display: &mut self.display,
            input: &mut self.input,
            mixer: &mut self.mixer,
            assets: &mut self.assets,
        }
    }
}
