//! Hash-map-keyed lazy patch storage.

use rustc_hash::FxHashMap;

use jbw_core::{PatchCoord, Registry, WorldConfig};

use crate::gibbs;
use crate::patch::Patch;

/// Owns every *fixed* patch ever materialized. Provisional patches are
/// never inserted here — they are recomputed from scratch on each use as
/// boundary context (PART C), which is cheap because `mcmc_iterations`
/// is small and the computation is a pure function of currently-fixed
/// neighbors.
#[derive(Default)]
pub struct PatchStore {
    patches: FxHashMap<PatchCoord, Patch>,
}

impl PatchStore {
    pub fn new() -> Self {
        PatchStore { patches: FxHashMap::default() }
    }

    pub fn get_if_fixed(&self, coord: PatchCoord) -> Option<&Patch> {
        self.patches.get(&coord)
    }

    pub fn get_if_fixed_mut(&mut self, coord: PatchCoord) -> Option<&mut Patch> {
        self.patches.get_mut(&coord)
    }

    pub fn contains_fixed(&self, coord: PatchCoord) -> bool {
        self.patches.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PatchCoord, &Patch)> {
        self.patches.iter()
    }

    /// Return the fixed patch at `coord`, materializing it (and, as a
    /// byproduct, only *reading* any already-fixed neighbors) if this is
    /// the first request for it. Deterministic given `(seed, px, py, set
    /// of currently-fixed neighbors)`.
    pub fn get_fixed_patch(&mut self, coord: PatchCoord, cfg: &WorldConfig, registry: &Registry) -> &Patch {
        if !self.patches.contains_key(&coord) {
            let patch = self.materialize(coord, cfg, registry, true);
            tracing::debug!(px = coord.px, py = coord.py, items = patch.items.len(), "materialized fixed patch");
            self.patches.insert(coord, patch);
        }
        self.patches.get(&coord).expect("just inserted")
    }

    fn materialize(&self, coord: PatchCoord, cfg: &WorldConfig, registry: &Registry, fixed: bool) -> Patch {
        let mut fixed_neighbors = Vec::new();
        for nb in coord.neighborhood() {
            if nb == coord {
                continue;
            }
            if let Some(p) = self.patches.get(&nb) {
                fixed_neighbors.push((nb, p.items.clone()));
            }
        }

        if fixed {
            gibbs::materialize_fixed(
                coord,
                cfg.patch_size,
                cfg.scent_dims,
                cfg.color_dims,
                &fixed_neighbors,
                &cfg.items,
                registry,
                cfg.seed,
                cfg.mcmc_iterations,
            )
        } else {
            gibbs::sample_provisional(
                coord,
                cfg.patch_size,
                cfg.scent_dims,
                cfg.color_dims,
                &fixed_neighbors,
                &cfg.items,
                registry,
                cfg.seed,
                cfg.mcmc_iterations,
            )
        }
    }

    /// Materialize every patch overlapping `[bl, tr]` inclusive, in
    /// patch-coordinate units. Patches strictly inside are fixed;
    /// patches only touched at the boundary of the *query* may still be
    /// returned as fixed if they happen to already be (or become, via
    /// `get_fixed_patch`) materialized — the World API always fixes
    /// anything it serves to a caller that can observe specific cells.
    pub fn get_map(&mut self, bl: PatchCoord, tr: PatchCoord, cfg: &WorldConfig, registry: &Registry) -> Vec<&Patch> {
        let mut coords = Vec::new();
        for py in bl.py..=tr.py {
            for px in bl.px..=tr.px {
                coords.push(PatchCoord::new(px, py));
            }
        }
        for &coord in &coords {
            self.get_fixed_patch(coord, cfg, registry);
        }
        coords.iter().map(|c| self.patches.get(c).expect("just materialized")).collect()
    }

    pub fn insert_snapshot_patch(&mut self, patch: Patch) {
        self.patches.insert(patch.coord, patch);
    }
}

/// Adapter letting [`crate::scent::catch_up`] read scent from neighboring
/// patches without taking a second mutable borrow of the store.
pub struct StoreScentLookup<'a> {
    pub store: &'a PatchStore,
    pub patch_size: u32,
}

impl<'a> crate::scent::ScentLookup for StoreScentLookup<'a> {
    fn scent_at(&self, gx: i64, gy: i64) -> Option<Vec<f32>> {
        let n = self.patch_size as i64;
        let coord = PatchCoord::new(gx.div_euclid(n), gy.div_euclid(n));
        let patch = self.store.get_if_fixed(coord)?;
        let local = (gx.rem_euclid(n) as u32, gy.rem_euclid(n) as u32);
        Some(patch.scent_at(local).to_vec())
    }
}
