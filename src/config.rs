//! Game configuration
//!
//! Everything that used to be a compile-time literal in the game loop lives
//! here and is injected when the session is created. Values come from
//! `GameConfig::default()`, an optional JSON file, then CLI overrides.

use crate::streaming::{STARTUP_BUFFER_LENGTH, SWITCH_BUFFER_LENGTH};
use crate::targets::{DamageMode, MAX_TARGETS};
use crate::{Result, WhackError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the in-loop stream switches (A / B buttons) open their file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSwitchPolicy {
    /// Never read the new file's header: sample rate 0, 8-bit mono, cursor
    /// left at byte 0, open failures ignored
    #[default]
    Legacy,
    /// Read and check the new file's header and derive real parameters;
    /// a failed open or bad header keeps the current stream
    ReadHeader,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Elimination policy per touch
    pub damage_mode: DamageMode,
    /// Targets spawned at startup (at most 32)
    pub target_count: usize,
    /// RNG seed; derived from the clock when absent
    pub seed: Option<u64>,
    /// Music streamed from startup and restored by B
    pub music_asset: String,
    /// Music switched to by A
    pub alt_music_asset: String,
    /// Sound-effect bank blob
    pub soundbank_asset: String,
    /// Mixer buffer length for the startup stream
    pub stream_buffer_length: usize,
    /// Mixer buffer length for the in-loop switches
    pub switch_buffer_length: usize,
    /// In-loop stream switch behavior
    pub stream_switch: StreamSwitchPolicy,
    /// Idle on the display tick after a startup-fatal error instead of
    /// returning it
    pub halt_on_fatal: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            damage_mode: DamageMode::Nearest,
            target_count: MAX_TARGETS,
            seed: None,
            music_asset: "nitro:/ssbm_hitthetargets.wav".into(),
            alt_music_asset: "nitro:/bart.wav".into(),
            soundbank_asset: "nitro:/soundbank.bin".into(),
            stream_buffer_length: STARTUP_BUFFER_LENGTH,
            switch_buffer_length: SWITCH_BUFFER_LENGTH,
            stream_switch: StreamSwitchPolicy::Legacy,
            halt_on_fatal: true,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document; missing keys keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(text)
            .map_err(|e| WhackError::ConfigError(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            WhackError::ConfigError(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.target_count > MAX_TARGETS {
            return Err(WhackError::ConfigError(format!(
                "target_count {} exceeds the maximum of {MAX_TARGETS}",
                self.target_count
            )));
        }
        if self.stream_buffer_length == 0 || self.switch_buffer_length == 0 {
            return Err(WhackError::ConfigError(
                "stream buffer lengths must be greater than 0".into(),
            ));
        }
        for (key, name) in [
            ("music_asset", &self.music_asset),
            ("alt_music_asset", &self.alt_music_asset),
            ("soundbank_asset", &self.soundbank_asset),
        ] {
            if name.trim().is_empty() {
                return Err(WhackError::ConfigError(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// Seed to use, falling back to the wall clock
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.damage_mode, DamageMode::Nearest);
        assert_eq!(config.target_count, 32);
        assert_eq!(config.stream_buffer_length, 800);
        assert_eq!(config.switch_buffer_length, 16000);
        assert_eq!(config.stream_switch, StreamSwitchPolicy::Legacy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            GameConfig::from_json(r#"{"damage_mode": "area", "seed": 42, "target_count": 8}"#)
                .unwrap();
        assert_eq!(config.damage_mode, DamageMode::Area);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.target_count, 8);
        assert_eq!(config.music_asset, GameConfig::default().music_asset);
    }

    #[test]
    fn test_switch_policy_json() {
        let config = GameConfig::from_json(r#"{"stream_switch": "read_header"}"#).unwrap();
        assert_eq!(config.stream_switch, StreamSwitchPolicy::ReadHeader);
    }

    #[test]
    fn test_rejects_too_many_targets() {
        let err = GameConfig::from_json(r#"{"target_count": 40}"#).unwrap_err();
        assert!(err.to_string().contains("target_count"));
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let config = GameConfig {
            switch_buffer_length: 0,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(WhackError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            GameConfig::from_json("{not json"),
            Err(WhackError::ConfigError(_))
        ));
    }

    #[test]
    fn test_seed_override() {
        let config = GameConfig {
            seed: Some(7),
            ..GameConfig::default()
        };
        assert_eq!(config.resolved_seed(), 7);
    }
}
