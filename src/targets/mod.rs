//! Target arena
//!
//! Targets live in a fixed-capacity arena indexed by a stable id that doubles
//! as the sprite-engine object index. Eliminated targets stay in place as
//! [`Slot::Eliminated`]; the arena is never compacted.

pub mod hit;

pub use hit::{resolve_hit, DamageMode, AREA_RADIUS, NEAREST_RADIUS, SPRITE_HALF_SIZE};

use crate::{Result, WhackError};
use rand::Rng;

/// Compile-time maximum number of targets
pub const MAX_TARGETS: usize = 32;

/// Spawn positions are `margin + rand[0, span]` on each axis
pub const SPAWN_MARGIN: i32 = 16;
/// Horizontal spawn span
pub const SPAWN_SPAN_X: i32 = 220;
/// Vertical spawn span
pub const SPAWN_SPAN_Y: i32 = 170;

/// Largest per-frame step
pub const MAX_SPEED: i32 = 3;

/// Screen position of a sprite's top-left corner, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Horizontal pixel
    pub x: i32,
    /// Vertical pixel
    pub y: i32,
}

impl Position {
    /// Construct a position
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }
}

/// One arena entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Still on screen
    Live(Position),
    /// Hit by the player
    Eliminated,
}

impl Slot {
    /// Position if the target is live
    pub fn position(&self) -> Option<Position> {
        match self {
            Slot::Live(pos) => Some(*pos),
            Slot::Eliminated => None,
        }
    }
}

/// Containment thresholds
///
/// Past a threshold the random direction bit for that axis is overridden to
/// nudge the target back; positions are never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// Below this x the target is pushed right
    pub min_x: i32,
    /// Above this x the target is pushed left
    pub max_x: i32,
    /// Below this y the target is pushed down
    pub min_y: i32,
    /// Above this y the target is pushed up
    pub max_y: i32,
}

impl Default for Boundary {
    fn default() -> Self {
        Boundary {
            min_x: 16,
            max_x: 240,
            min_y: 16,
            max_y: 184,
        }
    }
}

/// Random draws for one target in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// X direction bit: true means "increase x"
    pub x_up: bool,
    /// Y direction bit: true means "increase y"
    pub y_up: bool,
    /// Distance to move, 0..=3
    pub speed: i32,
}

impl Step {
    /// Draw x bit, y bit and speed, in that order
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let x_up = rng.gen_range(0..=1u8) == 1;
        let y_up = rng.gen_range(0..=1u8) == 1;
        let speed = rng.gen_range(0..=MAX_SPEED);
        Step { x_up, y_up, speed }
    }

    /// Apply the step to `pos` under `bounds`.
    pub fn apply(self, pos: Position, bounds: &Boundary) -> Position {
        Position {
            x: move_axis(pos.x, self.x_up, self.speed, bounds.min_x, bounds.max_x),
            y: move_axis(pos.y, self.y_up, self.speed, bounds.min_y, bounds.max_y),
        }
    }
}

fn move_axis(value: i32, up: bool, speed: i32, min: i32, max: i32) -> i32 {
    let up = if value > max {
        false
    } else if value < min {
        true
    } else {
        up
    };

    let mut v = value;
    if !up {
        v -= speed;
    }
    // Checked against the already-moved value: dipping under `min` while
    // heading down cancels the move for this frame.
    if up || v < min {
        v += speed;
    }
    v
}

/// Arena of up to [`MAX_TARGETS`] targets
#[derive(Debug, Clone)]
pub struct TargetSet {
    slots: Vec<Slot>,
    live: usize,
    bounds: Boundary,
}

impl TargetSet {
    /// Build an arena from explicit positions
    pub fn from_positions(positions: &[Position]) -> Result<Self> {
        if positions.len() > MAX_TARGETS {
            return Err(WhackError::ConfigError(format!(
                "{} targets requested, at most {} supported",
                positions.len(),
                MAX_TARGETS
            )));
        }

        Ok(TargetSet {
            slots: positions.iter().copied().map(Slot::Live).collect(),
            live: positions.len(),
            bounds: Boundary::default(),
        })
    }

    /// Place `count` targets at random inside the spawn area
    pub fn spawn<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Result<Self> {
        if count > MAX_TARGETS {
            return Err(WhackError::ConfigError(format!(
                "{count} targets requested, at most {MAX_TARGETS} supported"
            )));
        }

        let positions: Vec<Position> = (0..count)
            .map(|_| {
                let x = rng.gen_range(0..=SPAWN_SPAN_X) + SPAWN_MARGIN;
                let y = rng.gen_range(0..=SPAWN_SPAN_Y) + SPAWN_MARGIN;
                Position::new(x, y)
            })
            .collect();

        Self::from_positions(&positions)
    }

    /// Number of slots, live or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the arena has no slots at all
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remaining live targets
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Slot at `index`
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// All slots in id order
    pub fn iter(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slots.iter()
    }

    /// Move every live target by one random step.
    ///
    /// `on_move` receives the id and new position of each live target, in
    /// id order; the game loop pushes these to the sprite engine.
    pub fn advance<R, F>(&mut self, rng: &mut R, mut on_move: F)
    where
        R: Rng + ?Sized,
        F: FnMut(usize, Position),
    {
        let bounds = self.bounds;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Live(pos) = slot {
                let next = Step::random(rng).apply(*pos, &bounds);
                *pos = next;
                on_move(index, next);
            }
        }
    }

    /// Advance a single target with a known step (no randomness)
    pub fn advance_with(&mut self, index: usize, step: Step) -> Option<Position> {
        let bounds = self.bounds;
        match self.slots.get_mut(index) {
            Some(Slot::Live(pos)) => {
                *pos = step.apply(*pos, &bounds);
                Some(*pos)
            }
            _ => None,
        }
    }

    /// Mark a target eliminated.
    ///
    /// Returns false, leaving the live count alone, if the slot is out of
    /// range or already eliminated.
    pub fn eliminate(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if matches!(slot, Slot::Live(_)) => {
                *slot = Slot::Eliminated;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn step(x_up: bool, y_up: bool, speed: i32) -> Step {
        Step { x_up, y_up, speed }
    }

    fn single(x: i32, y: i32) -> TargetSet {
        TargetSet::from_positions(&[Position::new(x, y)]).unwrap()
    }

    #[test]
    fn test_spawn_within_area() {
        let mut rng = Pcg32::seed_from_u64(7);
        let set = TargetSet::spawn(MAX_TARGETS, &mut rng).unwrap();
        assert_eq!(set.len(), 32);
        assert_eq!(set.live_count(), 32);
        for slot in set.iter() {
            let pos = slot.position().unwrap();
            assert!((16..=236).contains(&pos.x), "x {}", pos.x);
            assert!((16..=186).contains(&pos.y), "y {}", pos.y);
        }
    }

    #[test]
    fn test_spawn_rejects_too_many() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(matches!(
            TargetSet::spawn(33, &mut rng),
            Err(WhackError::ConfigError(_))
        ));
    }

    #[test]
    fn test_interior_follows_random_bits() {
        let mut set = single(100, 100);
        assert_eq!(
            set.advance_with(0, step(true, false, 2)),
            Some(Position::new(102, 98))
        );
        assert_eq!(
            set.advance_with(0, step(false, true, 3)),
            Some(Position::new(99, 101))
        );
    }

    #[test]
    fn test_right_edge_overrides_bit() {
        let mut set = single(250, 100);
        let pos = set.advance_with(0, step(true, true, 3)).unwrap();
        assert_eq!(pos.x, 247);
    }

    #[test]
    fn test_left_edge_overrides_bit() {
        let mut set = single(10, 100);
        let pos = set.advance_with(0, step(false, true, 2)).unwrap();
        assert_eq!(pos.x, 12);
    }

    #[test]
    fn test_bottom_edge_overrides_bit() {
        let mut set = single(100, 190);
        let pos = set.advance_with(0, step(true, true, 3)).unwrap();
        assert_eq!(pos.y, 187);
    }

    #[test]
    fn test_top_edge_overrides_bit() {
        let mut set = single(100, 5);
        let pos = set.advance_with(0, step(true, false, 1)).unwrap();
        assert_eq!(pos.y, 6);
    }

    #[test]
    fn test_crossing_min_while_decreasing_cancels() {
        // 17 - 3 = 14 < 16, so the second check pushes it straight back
        let mut set = single(17, 17);
        let pos = set.advance_with(0, step(false, false, 3)).unwrap();
        assert_eq!(pos, Position::new(17, 17));
    }

    #[test]
    fn test_advance_skips_eliminated() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut set =
            TargetSet::from_positions(&[Position::new(50, 50), Position::new(60, 60)]).unwrap();
        set.eliminate(0);

        let mut moved = Vec::new();
        set.advance(&mut rng, |i, _| moved.push(i));
        assert_eq!(moved, vec![1]);
        assert_eq!(set.get(0), Some(&Slot::Eliminated));
    }

    #[test]
    fn test_advance_stays_near_screen() {
        let mut rng = Pcg32::seed_from_u64(99);
        let mut set = TargetSet::spawn(MAX_TARGETS, &mut rng).unwrap();
        for _ in 0..5000 {
            set.advance(&mut rng, |_, _| {});
        }
        for slot in set.iter() {
            let pos = slot.position().unwrap();
            assert!((16 - MAX_SPEED * 2..=240 + MAX_SPEED).contains(&pos.x));
            assert!((16 - MAX_SPEED * 2..=184 + MAX_SPEED).contains(&pos.y));
        }
    }

    #[test]
    fn test_eliminate_once() {
        let mut set = single(10, 10);
        assert!(set.eliminate(0));
        assert_eq!(set.live_count(), 0);
        assert!(!set.eliminate(0));
        assert!(!set.eliminate(5));
        assert_eq!(set.live_count(), 0);
    }
}
