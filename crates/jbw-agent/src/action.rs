//! The action an agent commits for the current tick.

use jbw_core::{Direction, TurnDirection};

/// One agent action, submitted at most once per tick.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Move { dir: Direction, steps: u32 },
    Turn { turn: TurnDirection },
    NoOp,
}
