//! Game session and frame loop
//!
//! A [`GameSession`] owns every piece of mutable game state: the target
//! arena, the win flag, the shared stream cursor and the RNG. Each frame the
//! loop borrows the platform services, runs the fixed per-frame sequence and
//! reports a [`FrameOutcome`].

pub mod session;

pub use session::{GameSession, SessionSummary};

use crate::targets::DamageMode;

/// What one frame ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep looping
    Continue,
    /// The win transition ran during this frame
    Won,
    /// The player pressed START
    Exit,
}

/// Win flag and damage policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    won: bool,
    damage_mode: DamageMode,
}

impl GameState {
    /// Fresh state in the playing phase
    pub fn new(damage_mode: DamageMode) -> Self {
        GameState {
            won: false,
            damage_mode,
        }
    }

    /// Whether the win transition already ran
    pub fn is_won(&self) -> bool {
        self.won
    }

    /// Elimination policy fixed at session creation
    pub fn damage_mode(&self) -> DamageMode {
        self.damage_mode
    }

    /// Enter the won phase if `live` reached zero.
    ///
    /// Returns true exactly once: on the call that performs the transition.
    pub fn check_win(&mut self, live: usize) -> bool {
        if live == 0 && !self.won {
            self.won = true;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_fires_once() {
        let mut state = GameState::new(DamageMode::Nearest);
        assert!(!state.check_win(3));
        assert!(state.check_win(0));
        assert!(state.is_won());
        assert!(!state.check_win(0));
        assert!(!state.check_win(0));
    }

    #[test]
    fn test_damage_mode_kept() {
        let state = GameState::new(DamageMode::Area);
        assert_eq!(state.damage_mode(), DamageMode::Area);
        assert!(!state.is_won());
    }
}
