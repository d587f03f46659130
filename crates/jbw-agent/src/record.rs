//! Per-agent state.
//!
//! Unlike the Structure-of-Arrays layout a throughput-oriented tick loop
//! usually reaches for, each `AgentRecord` here carries its own lock
//!. Remote clients and local callbacks
//! can read an agent's cached state without contending with every other
//! agent in the world, at the cost of one allocation and one lock per
//! agent instead of a flat array.

use std::sync::Mutex;

use jbw_core::{Direction, ItemTypeId, Position};

use crate::action::Action;

/// Cached per-agent sensory state, refreshed once per tick by the
/// coordinator's apply phase. Never recomputed on demand —
/// a read always returns the value as of the last `Resolving` phase.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentCaches {
    /// `S`-dimensional scent vector at the agent's current cell.
    pub scent: Vec<f32>,
    /// `(2R+1)^2 * C` vision window, row-major, centered on the agent.
    pub vision: Vec<f32>,
}

/// Everything the simulator tracks about one embodied agent.
///
/// Constructed by [`crate::registry::AgentRegistry::add_agent`]; never
/// constructed directly by callers outside this crate.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentRecord {
    pub position: Position,
    pub facing: Direction,
    pub caches: AgentCaches,
    /// Count of each item type currently held, indexed by `ItemTypeId::index()`.
    pub inventory: Vec<u32>,
    /// Whether this agent is in the required-set for the next tick.
    pub active: bool,
    /// The action committed for the current tick, if any. Cleared by the
    /// coordinator's apply phase.
    pub pending_action: Option<Action>,
}

impl AgentRecord {
    pub fn new(position: Position, facing: Direction, item_type_count: usize) -> Self {
        AgentRecord {
            position,
            facing,
            caches: AgentCaches::default(),
            inventory: vec![0; item_type_count],
            active: true,
            pending_action: None,
        }
    }

    #[inline]
    pub fn inventory_of(&self, item: ItemTypeId) -> u32 {
        self.inventory.get(item.index()).copied().unwrap_or(0)
    }

    #[inline]
    pub fn has_acted(&self) -> bool {
        self.pending_action.is_some()
    }

    /// Snapshot the fields the wire protocol's `agent_state` layout carries
    ///: position, facing, scent, vision, inventory. `pending_action`
    /// never crosses the wire.
    pub fn to_state(&self) -> AgentState {
        AgentState {
            position: self.position,
            facing: self.facing,
            scent: self.caches.scent.clone(),
            vision: self.caches.vision.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

/// A point-in-time copy of everything `agent_state` serializes. Used
/// by the step callback, `GET_AGENT_STATES`, and the snapshot codec alike
/// so all three agree on exactly one definition of "an agent's state".
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentState {
    pub position: Position,
    pub facing: Direction,
    pub scent: Vec<f32>,
    pub vision: Vec<f32>,
    pub inventory: Vec<u32>,
}

/// An `AgentRecord` behind the per-agent mutex the concurrency model
/// requires. `Mutex` (not `RwLock`) because every access — even a cache
/// read — is brief and exclusive is cheap to reason about.
pub type AgentLock = Mutex<AgentRecord>;
