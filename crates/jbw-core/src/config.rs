//! World and simulator configuration.
//!
//! Parsing a config *file* is left to the host binary; what lives here
//! is the config *type* and its validation, since the core must be able
//! to reject a bad configuration at construction time
//! (`InvalidConfiguration` is fatal).

use crate::error::{JbwError, JbwResult};
use crate::item::ItemType;
use crate::policy::{ActionPolicy, MovementConflictPolicy};

/// Per-direction action gating, one entry for each of `{Up, Down, Left,
/// Right}` in that order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionPolicies {
    pub up: ActionPolicy,
    pub down: ActionPolicy,
    pub left: ActionPolicy,
    pub right: ActionPolicy,
}

impl Default for DirectionPolicies {
    fn default() -> Self {
        DirectionPolicies {
            up: ActionPolicy::Allowed,
            down: ActionPolicy::Allowed,
            left: ActionPolicy::Allowed,
            right: ActionPolicy::Allowed,
        }
    }
}

/// Per-turn action gating, one entry for each of `{NoChange, Reverse,
/// Left, Right}`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnPolicies {
    pub no_change: ActionPolicy,
    pub reverse: ActionPolicy,
    pub left: ActionPolicy,
    pub right: ActionPolicy,
}

impl Default for TurnPolicies {
    fn default() -> Self {
        TurnPolicies {
            no_change: ActionPolicy::Allowed,
            reverse: ActionPolicy::Allowed,
            left: ActionPolicy::Allowed,
            right: ActionPolicy::Allowed,
        }
    }
}

/// Configuration for the world model: geometry, the item catalog, and
/// the Gibbs sampler's parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    /// Side length `N` of a square patch.
    pub patch_size: u32,
    /// Vision window half-width `R`; an agent sees a `(2R+1)×(2R+1)` window.
    pub vision_radius: u32,
    /// Scent vector dimensionality `S`.
    pub scent_dims: u32,
    /// Vision color-channel dimensionality `C`.
    pub color_dims: u32,
    pub items: Vec<ItemType>,
    /// Gibbs sweeps per patch materialization.
    pub mcmc_iterations: u32,
    /// Scent decay multiplier applied each tick, in `[0, 1]`.
    pub scent_decay: f32,
    /// Scent diffusion multiplier applied each tick, in `[0, 1]`.
    pub scent_diffusion: f32,
    /// Ticks a removed item continues to contribute afterglow scent.
    pub deleted_item_lifetime: u32,
    pub movement_conflict_policy: MovementConflictPolicy,
    pub direction_policies: DirectionPolicies,
    pub turn_policies: TurnPolicies,
    /// Master RNG seed; every derived stream (`GibbsRng`, `TickRng`) is a
    /// deterministic function of this value.
    pub seed: u64,
}

impl WorldConfig {
    /// Reject configurations the rest of the core cannot operate on.
    /// Called once at simulator construction.
    pub fn validate(&self) -> JbwResult<()> {
        if self.patch_size == 0 {
            return Err(JbwError::InvalidConfiguration("patch_size must be > 0".into()));
        }
        if self.scent_dims == 0 {
            return Err(JbwError::InvalidConfiguration("scent_dims must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.scent_decay) {
            return Err(JbwError::InvalidConfiguration("scent_decay must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.scent_diffusion) {
            return Err(JbwError::InvalidConfiguration("scent_diffusion must be in [0, 1]".into()));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.scent_vec.len() != self.scent_dims as usize {
                return Err(JbwError::InvalidConfiguration(format!(
                    "item {idx} ({}) has {} scent dims, expected {}",
                    item.name,
                    item.scent_vec.len(),
                    self.scent_dims
                )));
            }
            if item.color_vec.len() != self.color_dims as usize {
                return Err(JbwError::InvalidConfiguration(format!(
                    "item {idx} ({}) has {} color dims, expected {}",
                    item.name,
                    item.color_vec.len(),
                    self.color_dims
                )));
            }
            if item.required_counts.len() != self.items.len() || item.required_costs.len() != self.items.len() {
                return Err(JbwError::InvalidConfiguration(format!(
                    "item {idx} ({}) required_counts/required_costs must have one entry per item type",
                    item.name
                )));
            }
        }
        Ok(())
    }
}

/// Top-level configuration combining the world model with step-coordination
/// parameters that aren't world properties (e.g. the server doesn't need to
/// know these, but the in-process simulator construction does).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulatorConfig {
    pub world: WorldConfig,
}

impl SimulatorConfig {
    pub fn validate(&self) -> JbwResult<()> {
        self.world.validate()
    }
}
