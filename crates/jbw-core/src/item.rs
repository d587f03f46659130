//! Item types and the tagged-variant energy functions the Gibbs sampler
//! evaluates against them.
//!
//! `IntensityFn` and `InteractionFn` are `{id, args}` pairs rather than
//! trait objects — per the design note on polymorphism over energy
//! functions, there is no dynamic dispatch across a language boundary
//! here, but keeping the same shape lets a host register additional ids
//! without this crate knowing about them ahead of time.

use std::collections::HashMap;

use crate::ids::ItemTypeId;

/// A single item type in the simulator's catalog.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemType {
    pub name: String,
    pub scent_vec: Vec<f32>,
    pub color_vec: Vec<f32>,
    /// `required_counts[u]`: minimum inventory of item `u` needed before
    /// this item may be collected.
    pub required_counts: Vec<u32>,
    /// `required_costs[u]`: amount of item `u` debited on collection.
    /// May be less than `required_counts[u]` — counts gate eligibility,
    /// costs are what's actually spent.
    pub required_costs: Vec<u32>,
    pub blocks_movement: bool,
    pub intensity_fn: IntensityFn,
    /// Sparse by target item-type id; absent entries contribute zero
    /// interaction energy.
    pub interaction_fn: HashMap<ItemTypeId, InteractionFn>,
}

/// A tagged intensity function: `id` selects the evaluation routine,
/// `args` are its parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntensityFn {
    pub id: u16,
    pub args: Vec<f32>,
}

/// A tagged pairwise interaction function between this item type and
/// `target_item`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractionFn {
    pub id: u16,
    pub target_item: ItemTypeId,
    pub args: Vec<f32>,
}

/// Built-in intensity function ids.
pub mod intensity_ids {
    /// `E = args[0]`, independent of position.
    pub const CONSTANT: u16 = 0;
    /// `E = args[0] + args[1] * distance_from_origin(c)`.
    pub const LINEAR_WITH_DISTANCE: u16 = 1;
    /// `E = args[0] * exp(-distance_from_origin(c)^2 / (2 * args[1]^2))`.
    pub const GAUSSIAN: u16 = 2;
}

/// Built-in interaction function ids.
pub mod interaction_ids {
    /// `E = args[0]`, independent of the pair's separation.
    pub const CONSTANT: u16 = 0;
    /// Piecewise-constant in the Chebyshev distance between cells:
    /// `args[2*k]` is a distance threshold, `args[2*k+1]` the energy for
    /// pairs at or within that threshold; the final pair (no threshold
    /// slot) is the energy beyond every listed threshold.
    pub const PIECEWISE_BY_DISTANCE: u16 = 1;
}

fn distance_from_origin(cx: i64, cy: i64) -> f32 {
    ((cx * cx + cy * cy) as f64).sqrt() as f32
}

fn chebyshev_distance(ax: i64, ay: i64, bx: i64, by: i64) -> i64 {
    (ax - bx).abs().max((ay - by).abs())
}

impl IntensityFn {
    pub fn constant(energy: f32) -> Self {
        IntensityFn { id: intensity_ids::CONSTANT, args: vec![energy] }
    }

    pub fn linear_with_distance(base: f32, slope: f32) -> Self {
        IntensityFn { id: intensity_ids::LINEAR_WITH_DISTANCE, args: vec![base, slope] }
    }

    pub fn gaussian(amplitude: f32, sigma: f32) -> Self {
        IntensityFn { id: intensity_ids::GAUSSIAN, args: vec![amplitude, sigma] }
    }

    /// Evaluate the intensity term of `E(c, t)` for this item type at
    /// cell `(cx, cy)` using only the built-in catalog. Unknown ids
    /// return `0.0` (no contribution) — callers wanting host-registered
    /// ids should go through `Registry::eval_intensity` instead.
    pub fn eval(&self, cx: i64, cy: i64) -> f32 {
        match self.id {
            intensity_ids::CONSTANT => self.args.first().copied().unwrap_or(0.0),
            intensity_ids::LINEAR_WITH_DISTANCE => {
                let base = self.args.first().copied().unwrap_or(0.0);
                let slope = self.args.get(1).copied().unwrap_or(0.0);
                base + slope * distance_from_origin(cx, cy)
            }
            intensity_ids::GAUSSIAN => {
                let amp = self.args.first().copied().unwrap_or(0.0);
                let sigma = self.args.get(1).copied().unwrap_or(1.0).max(f32::EPSILON);
                let d = distance_from_origin(cx, cy);
                amp * (-(d * d) / (2.0 * sigma * sigma)).exp()
            }
            _ => 0.0,
        }
    }
}

impl InteractionFn {
    pub fn constant(target_item: ItemTypeId, energy: f32) -> Self {
        InteractionFn { id: interaction_ids::CONSTANT, target_item, args: vec![energy] }
    }

    pub fn piecewise_by_distance(target_item: ItemTypeId, thresholds: &[(i64, f32)], beyond: f32) -> Self {
        let mut args = Vec::with_capacity(thresholds.len() * 2 + 1);
        for (dist, energy) in thresholds {
            args.push(*dist as f32);
            args.push(*energy);
        }
        args.push(beyond);
        InteractionFn { id: interaction_ids::PIECEWISE_BY_DISTANCE, target_item, args }
    }

    /// Evaluate the pairwise interaction energy between a candidate cell
    /// `(cx, cy)` and an already-placed item at `(ox, oy)`.
    pub fn eval(&self, cx: i64, cy: i64, ox: i64, oy: i64) -> f32 {
        match self.id {
            interaction_ids::CONSTANT => self.args.first().copied().unwrap_or(0.0),
            interaction_ids::PIECEWISE_BY_DISTANCE => {
                let d = chebyshev_distance(cx, cy, ox, oy);
                let mut i = 0;
                while i + 1 < self.args.len() {
                    let threshold = self.args[i] as i64;
                    let energy = self.args[i + 1];
                    if d <= threshold {
                        return energy;
                    }
                    i += 2;
                }
                self.args.last().copied().unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }
}

/// Extension point for host-registered intensity/interaction ids beyond
/// the built-in catalog.
pub struct Registry {
    intensity: HashMap<u16, Box<dyn Fn(&IntensityFn, i64, i64) -> f32 + Send + Sync>>,
    interaction: HashMap<u16, Box<dyn Fn(&InteractionFn, i64, i64, i64, i64) -> f32 + Send + Sync>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { intensity: HashMap::default(), interaction: HashMap::default() }
    }

    pub fn register_intensity(
        &mut self,
        id: u16,
        f: impl Fn(&IntensityFn, i64, i64) -> f32 + Send + Sync + 'static,
    ) {
        self.intensity.insert(id, Box::new(f));
    }

    pub fn register_interaction(
        &mut self,
        id: u16,
        f: impl Fn(&InteractionFn, i64, i64, i64, i64) -> f32 + Send + Sync + 'static,
    ) {
        self.interaction.insert(id, Box::new(f));
    }

    /// Falls back to `IntensityFn::eval`'s built-in catalog when `id` has
    /// no registered override.
    pub fn eval_intensity(&self, f: &IntensityFn, cx: i64, cy: i64) -> f32 {
        match self.intensity.get(&f.id) {
            Some(routine) => routine(f, cx, cy),
            None => f.eval(cx, cy),
        }
    }

    /// Falls back to `InteractionFn::eval`'s built-in catalog when `id`
    /// has no registered override.
    pub fn eval_interaction(&self, f: &InteractionFn, cx: i64, cy: i64, ox: i64, oy: i64) -> f32 {
        match self.interaction.get(&f.id) {
            Some(routine) => routine(f, cx, cy, ox, oy),
            None => f.eval(cx, cy, ox, oy),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("intensity_overrides", &self.intensity.len())
            .field("interaction_overrides", &self.interaction.len())
            .finish()
    }
}
