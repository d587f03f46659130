//! Grid position and facing.

use std::fmt;
use std::ops::Add;

/// A signed cell coordinate on the infinite grid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The cell one step away in `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> Position {
        self + dir.unit()
    }

    /// The cell `n` steps away in `dir`.
    #[inline]
    pub fn step_n(self, dir: Direction, n: u32) -> Position {
        let (dx, dy) = dir.unit_tuple();
        Position::new(self.x + dx * n as i64, self.y + dy * n as i64)
    }

    /// `(px, py)` of the patch of side `patch_size` containing this cell.
    /// Uses floor division so negative coordinates map correctly.
    pub fn patch_coord(self, patch_size: u32) -> (i64, i64) {
        let n = patch_size as i64;
        (self.x.div_euclid(n), self.y.div_euclid(n))
    }

    /// Position within its own patch, in `[0, patch_size)`.
    pub fn cell_in_patch(self, patch_size: u32) -> (u32, u32) {
        let n = patch_size as i64;
        (self.x.rem_euclid(n) as u32, self.y.rem_euclid(n) as u32)
    }
}

impl Add<(i64, i64)> for Position {
    type Output = Position;
    fn add(self, (dx, dy): (i64, i64)) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Absolute facing direction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    #[inline]
    pub fn unit_tuple(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    #[inline]
    pub fn unit(self) -> (i64, i64) {
        self.unit_tuple()
    }

    /// Wire encoding used by the MOVE/TURN request payloads.
    pub fn to_wire(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_wire(tag: u8) -> Option<Direction> {
        match tag {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }
}

/// A turn relative to the agent's current facing.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnDirection {
    NoChange,
    Reverse,
    Left,
    Right,
}

impl TurnDirection {
    /// Compose with `facing` to produce the new facing.
    pub fn apply(self, facing: Direction) -> Direction {
        use Direction::*;
        match (self, facing) {
            (TurnDirection::NoChange, f) => f,
            (TurnDirection::Reverse, Up) => Down,
            (TurnDirection::Reverse, Down) => Up,
            (TurnDirection::Reverse, Left) => Right,
            (TurnDirection::Reverse, Right) => Left,
            (TurnDirection::Left, Up) => Left,
            (TurnDirection::Left, Left) => Down,
            (TurnDirection::Left, Down) => Right,
            (TurnDirection::Left, Right) => Up,
            (TurnDirection::Right, Up) => Right,
            (TurnDirection::Right, Right) => Down,
            (TurnDirection::Right, Down) => Left,
            (TurnDirection::Right, Left) => Up,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            TurnDirection::NoChange => 0,
            TurnDirection::Reverse => 1,
            TurnDirection::Left => 2,
            TurnDirection::Right => 3,
        }
    }

    pub fn from_wire(tag: u8) -> Option<TurnDirection> {
        match tag {
            0 => Some(TurnDirection::NoChange),
            1 => Some(TurnDirection::Reverse),
            2 => Some(TurnDirection::Left),
            3 => Some(TurnDirection::Right),
            _ => None,
        }
    }
}
