//! Headless display
//!
//! Keeps the sprite table and background image in memory so runs can be
//! inspected after the fact, and paces frames through a [`VblSync`].

use super::vbl::{TimingConfig, VblSync};
use crate::platform::{Display, ScreenImage};
use crate::targets::MAX_TARGETS;

/// Number of hardware sprite slots
pub const SPRITE_SLOTS: usize = 128;

/// One sprite table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteAttr {
    /// Horizontal pixel
    pub x: i32,
    /// Vertical pixel
    pub y: i32,
}

/// In-memory display surface
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    vbl: VblSync,
    /// Attributes written since the last commit
    pending: Vec<Option<SpriteAttr>>,
    /// Attributes the "hardware" shows
    visible: Vec<Option<SpriteAttr>>,
    image: Option<ScreenImage>,
    background_updates: u64,
    commits: u64,
}

impl HeadlessDisplay {
    /// Create a display paced by `timing`
    pub fn new(timing: TimingConfig) -> Self {
        HeadlessDisplay {
            vbl: VblSync::new(timing),
            pending: vec![None; SPRITE_SLOTS],
            visible: vec![None; SPRITE_SLOTS],
            image: None,
            background_updates: 0,
            commits: 0,
        }
    }

    /// Change frame pacing from now on
    pub fn set_timing(&mut self, timing: TimingConfig) {
        self.vbl.set_timing(timing);
    }

    /// Background image currently uploaded
    pub fn image(&self) -> Option<ScreenImage> {
        self.image
    }

    /// Committed sprite at `index`
    pub fn sprite(&self, index: usize) -> Option<SpriteAttr> {
        self.visible.get(index).copied().flatten()
    }

    /// Sprite at `index` including uncommitted writes
    pub fn pending_sprite(&self, index: usize) -> Option<SpriteAttr> {
        self.pending.get(index).copied().flatten()
    }

    /// Number of committed sprites among the target slots
    pub fn visible_targets(&self) -> usize {
        self.visible[..MAX_TARGETS].iter().flatten().count()
    }

    /// Vertical blanks waited for
    pub fn frames(&self) -> u64 {
        self.vbl.vbl_count()
    }

    /// Sprite commits so far
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Background latches so far
    pub fn background_updates(&self) -> u64 {
        self.background_updates
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}

impl Display for HeadlessDisplay {
    fn wait_for_vblank(&mut self) {
        self.vbl.wait();
    }

    fn update_background(&mut self) {
        self.background_updates += 1;
    }

    fn commit_sprites(&mut self) {
        self.visible.copy_from_slice(&self.pending);
        self.commits += 1;
    }

    fn set_sprite(&mut self, index: usize, x: i32, y: i32) {
        if let Some(slot) = self.pending.get_mut(index) {
            *slot = Some(SpriteAttr { x, y });
        }
    }

    fn clear_sprite(&mut self, index: usize) {
        if let Some(slot) = self.pending.get_mut(index) {
            *slot = None;
        }
    }

    fn show_image(&mut self, image: ScreenImage) {
        tracing::debug!(?image, "background image uploaded");
        self.image = Some(image);
    }
}
