//! Hit resolution
//!
//! Turns one touch sample into eliminations. Distances run from the touch
//! point to the sprite centre, which sits [`SPRITE_HALF_SIZE`] pixels in from
//! the top-left position on both axes.

use super::{Position, Slot, TargetSet};
use crate::platform::TouchPoint;
use crate::WhackError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Half the 32x32 sprite edge
pub const SPRITE_HALF_SIZE: i32 = 16;

/// Reach of a touch in [`DamageMode::Nearest`]
pub const NEAREST_RADIUS: f64 = 16.0;

/// Reach of a touch in [`DamageMode::Area`]
pub const AREA_RADIUS: f64 = 32.0;

/// Elimination policy for a touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageMode {
    /// Only the closest target within 16 px
    #[default]
    Nearest,
    /// Every target within 32 px
    Area,
}

impl DamageMode {
    /// Touch reach for this mode
    pub fn radius(self) -> f64 {
        match self {
            DamageMode::Nearest => NEAREST_RADIUS,
            DamageMode::Area => AREA_RADIUS,
        }
    }
}

impl std::fmt::Display for DamageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DamageMode::Nearest => "nearest",
            DamageMode::Area => "area",
        })
    }
}

/// Parses `nearest` (alias `single`) and `area`, ignoring case
impl FromStr for DamageMode {
    type Err = WhackError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "nearest" | "single" => Ok(DamageMode::Nearest),
            "area" => Ok(DamageMode::Area),
            _ => Err(WhackError::ConfigError(format!(
                "unknown damage mode '{value}' (expected nearest or area)"
            ))),
        }
    }
}

/// Distance from `touch` to the centre of a sprite at `pos`
pub fn centre_distance(touch: TouchPoint, pos: Position) -> f64 {
    let dx = f64::from(pos.x + SPRITE_HALF_SIZE) - f64::from(touch.x);
    let dy = f64::from(pos.y + SPRITE_HALF_SIZE) - f64::from(touch.y);
    (dx * dx + dy * dy).sqrt()
}

/// Apply one touch to `targets` and return the ids eliminated, in id order.
///
/// Eliminated slots are never candidates. In [`DamageMode::Nearest`] the
/// first target found with a strictly smaller distance under the radius
/// wins, so ties go to the lower id.
pub fn resolve_hit(targets: &mut TargetSet, touch: TouchPoint, mode: DamageMode) -> Vec<usize> {
    let radius = mode.radius();
    let in_reach = targets
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| match slot {
            Slot::Live(pos) => Some((index, centre_distance(touch, *pos))),
            Slot::Eliminated => None,
        })
        .filter(|&(_, dist)| dist < radius);

    let hits: Vec<usize> = match mode {
        DamageMode::Nearest => {
            let mut best: Option<(usize, f64)> = None;
            for (index, dist) in in_reach {
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((index, dist));
                }
            }
            best.map(|(index, _)| index).into_iter().collect()
        }
        DamageMode::Area => in_reach.map(|(index, _)| index).collect(),
    };

    for &index in &hits {
        targets.eliminate(index);
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOUCH: TouchPoint = TouchPoint { x: 100, y: 100 };

    /// Sprite position whose centre sits `dist` px right of the touch point
    fn at_distance(dist: i32) -> Position {
        Position::new(TOUCH.x as i32 + dist - SPRITE_HALF_SIZE, TOUCH.y as i32 - SPRITE_HALF_SIZE)
    }

    #[test]
    fn test_centre_distance() {
        let pos = Position::new(100, 100);
        let touch = TouchPoint { x: 113, y: 112 };
        assert_relative_eq!(centre_distance(touch, pos), 5.0);
    }

    #[test]
    fn test_nearest_takes_only_closest() {
        let mut set =
            TargetSet::from_positions(&[at_distance(10), at_distance(5), at_distance(20)]).unwrap();

        let hits = resolve_hit(&mut set, TOUCH, DamageMode::Nearest);
        assert_eq!(hits, vec![1]);
        assert_eq!(set.live_count(), 2);
        assert_eq!(set.get(1), Some(&Slot::Eliminated));
    }

    #[test]
    fn test_nearest_out_of_reach() {
        let mut set = TargetSet::from_positions(&[at_distance(16), at_distance(30)]).unwrap();
        assert!(resolve_hit(&mut set, TOUCH, DamageMode::Nearest).is_empty());
        assert_eq!(set.live_count(), 2);
    }

    #[test]
    fn test_nearest_tie_goes_to_first() {
        let mut set = TargetSet::from_positions(&[at_distance(-8), at_distance(8)]).unwrap();
        assert_eq!(resolve_hit(&mut set, TOUCH, DamageMode::Nearest), vec![0]);
    }

    #[test]
    fn test_area_takes_all_in_radius() {
        let mut set =
            TargetSet::from_positions(&[at_distance(10), at_distance(20), at_distance(40)]).unwrap();

        let hits = resolve_hit(&mut set, TOUCH, DamageMode::Area);
        assert_eq!(hits, vec![0, 1]);
        assert_eq!(set.live_count(), 1);
    }

    #[test]
    fn test_eliminated_never_reselected() {
        let mut set = TargetSet::from_positions(&[at_distance(0)]).unwrap();
        assert_eq!(resolve_hit(&mut set, TOUCH, DamageMode::Area), vec![0]);

        for mode in [DamageMode::Nearest, DamageMode::Area] {
            assert!(resolve_hit(&mut set, TOUCH, mode).is_empty());
        }
        assert_eq!(set.live_count(), 0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("AREA".parse::<DamageMode>().unwrap(), DamageMode::Area);
        assert_eq!("nearest".parse::<DamageMode>().unwrap(), DamageMode::Nearest);
        assert_eq!("Single".parse::<DamageMode>().unwrap(), DamageMode::Nearest);
        assert!(matches!(
            "splash".parse::<DamageMode>(),
            Err(WhackError::ConfigError(_))
        ));
        assert_eq!(DamageMode::Area.to_string(), "area");
    }
}
