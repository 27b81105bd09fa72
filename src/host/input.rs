//! Scripted input
//!
//! Replays a list of per-frame input events. Frames with no event poll as
//! "nothing pressed". Scripts are JSON:
//!
//! ```json
//! [
//!   { "frame": 10, "touch": { "x": 120, "y": 90 } },
//!   { "frame": 30, "keys": ["A"] },
//!   { "frame": 600, "keys": ["START"] }
//! ]
//! ```
//!
//! An event with `touch` implies the `TOUCH` key.

use crate::platform::{Input, InputState, Keys, TouchPoint};
use crate::{Result, WhackError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One scripted frame as written in JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEvent {
    /// Frame number (1-based: the first scan is frame 1)
    pub frame: u64,
    /// Key names (`A`, `B`, `START`, `TOUCH`, ...)
    #[serde(default)]
    pub keys: Vec<String>,
    /// Touch sample
    #[serde(default)]
    pub touch: Option<TouchPoint>,
}

impl ScriptEvent {
    fn to_state(&self) -> Result<InputState> {
        let mut keys = Keys::empty();
        for name in &self.keys {
            let key = Keys::from_name(&name.to_ascii_uppercase()).ok_or_else(|| {
                WhackError::ConfigError(format!("unknown key '{name}' at frame {}", self.frame))
            })?;
            keys |= key;
        }
        if self.touch.is_some() {
            keys |= Keys::TOUCH;
        }
        Ok(InputState {
            keys_down: keys,
            touch: self.touch,
        })
    }
}

/// Input surface driven by a script
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: BTreeMap<u64, InputState>,
    frame: u64,
}

impl ScriptedInput {
    /// No input at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `state` for `frame`, merging with anything already there
    pub fn push(&mut self, frame: u64, state: InputState) -> &mut Self {
        let entry = self.events.entry(frame).or_default();
        entry.keys_down |= state.keys_down;
        if state.touch.is_some() {
            entry.touch = state.touch;
        }
        self
    }

    /// Builder form of [`ScriptedInput::push`]
    pub fn at(mut self, frame: u64, state: InputState) -> Self {
        self.push(frame, state);
        self
    }

    /// Build from parsed script events
    pub fn from_events(events: &[ScriptEvent]) -> Result<Self> {
        let mut input = ScriptedInput::new();
        for event in events {
            input.push(event.frame, event.to_state()?);
        }
        Ok(input)
    }

    /// Parse a JSON script
    pub fn from_json(text: &str) -> Result<Self> {
        let events: Vec<ScriptEvent> = serde_json::from_str(text)
            .map_err(|e| WhackError::ConfigError(format!("invalid input script: {e}")))?;
        Self::from_events(&events)
    }

    /// Load a JSON script from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            WhackError::ConfigError(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Frames scanned so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Last frame with a scripted event
    pub fn last_event_frame(&self) -> Option<u64> {
        self.events.keys().next_back().copied()
    }
}

impl Input for ScriptedInput {
    fn scan(&mut self) -> InputState {
        self.frame += 1;
        self.events.remove(&self.frame).unwrap_or_default()
    }
}
