//! Markov-chain item placement.
//!
//! Materializing a patch means deciding, for every cell, which item type
//! (if any) occupies it. The sampler treats this as a Gibbs sampling
//! problem over a combined `3N×3N` canvas: the requested patch plus its
//! 8 neighbors, so that boundary interactions are accounted for both
//! ways. Cells belonging to an already-fixed neighbor are pinned — they
//! contribute to every other cell's energy but are never themselves
//! redrawn. Everything else (including the 8 neighbor positions that
//! aren't yet fixed) is resampled fresh; only the center `N×N` block is
//! kept afterward. The neighbor blocks are thrown away — they exist only
//! to give the center's boundary cells a believable Markov blanket.

use jbw_core::{GibbsRng, ItemType, ItemTypeId, PatchCoord, Registry};

use crate::patch::{Patch, PatchItem};

struct WorkingCanvas {
    /// Side length of the combined canvas: `3 * patch_size`.
    side: u32,
    patch_size: u32,
    /// `Some(item)` once placed, `None` for empty.
    occupancy: Vec<Option<ItemTypeId>>,
    /// `true` for cells that belong to an already-fixed neighbor and must
    /// not be redrawn.
    pinned: Vec<bool>,
}

impl WorkingCanvas {
    fn new(patch_size: u32) -> Self {
        let side = patch_size * 3;
        let cells = (side * side) as usize;
        WorkingCanvas {
            side,
            patch_size,
            occupancy: vec![None; cells],
            pinned: vec![false; cells],
        }
    }

    #[inline]
    fn index(&self, lx: u32, ly: u32) -> usize {
        (ly * self.side + lx) as usize
    }

    /// Seed a fixed neighbor's items into the canvas at offset `(dx, dy)`
    /// in `{-1, 0, 1}^2` patch units, pinning those cells against resampling.
    fn seed_fixed_neighbor(&mut self, dx: i32, dy: i32, items: &[PatchItem]) {
        let ox = ((dx + 1) as u32) * self.patch_size;
        let oy = ((dy + 1) as u32) * self.patch_size;
        for item in items {
            let lx = ox + item.local.0;
            let ly = oy + item.local.1;
            let idx = self.index(lx, ly);
            self.occupancy[idx] = Some(item.item_type);
            self.pinned[idx] = true;
        }
    }

    /// Global cell position corresponding to canvas cell `(lx, ly)`, given
    /// the center patch's own coordinates and patch size `n`.
    fn global_cell(&self, center: PatchCoord, lx: u32, ly: u32) -> (i64, i64) {
        let n = self.patch_size as i64;
        let gx = (center.px - 1) * n + lx as i64;
        let gy = (center.py - 1) * n + ly as i64;
        (gx, gy)
    }

    /// Extract the center `N×N` block as the fixed patch's item list.
    fn center_items(&self) -> Vec<PatchItem> {
        let n = self.patch_size;
        let mut out = Vec::new();
        for ly in 0..n {
            for lx in 0..n {
                let idx = self.index(n + lx, n + ly);
                if let Some(t) = self.occupancy[idx] {
                    out.push(PatchItem { item_type: t, local: (lx, ly) });
                }
            }
        }
        out
    }
}

/// Run the Gibbs sweep for `center` and return its freshly materialized,
/// fixed patch. `fixed_neighbors` carries the item lists of any of
/// `center`'s 8 neighbors that are already permanently fixed in the
/// store; everything else is treated as empty context for this sweep.
pub fn materialize_fixed(
    center: PatchCoord,
    patch_size: u32,
    scent_dims: u32,
    color_dims: u32,
    fixed_neighbors: &[(PatchCoord, Vec<PatchItem>)],
    items: &[ItemType],
    registry: &Registry,
    seed: u64,
    mcmc_iterations: u32,
) -> Patch {
    let mut canvas = WorkingCanvas::new(patch_size);
    for (coord, neighbor_items) in fixed_neighbors {
        let dx = (coord.px - center.px) as i32;
        let dy = (coord.py - center.py) as i32;
        canvas.seed_fixed_neighbor(dx, dy, neighbor_items);
    }

    let cell_count = canvas.side * canvas.side;
    for iteration in 0..mcmc_iterations {
        for cell_index in 0..cell_count {
            let ly = cell_index / canvas.side;
            let lx = cell_index % canvas.side;
            let idx = canvas.index(lx, ly);
            if canvas.pinned[idx] {
                continue;
            }
            gibbs_update_cell(&mut canvas, center, lx, ly, items, registry, seed, iteration, cell_index);
        }
    }

    let mut patch = Patch::new_empty(center, patch_size, scent_dims, color_dims, true);
    patch.items = canvas.center_items();
    patch.rebuild_vision(items);
    patch
}

/// Resample a patch's own item set without promoting it to fixed — used
/// when `center` is needed only as boundary context for a sibling
/// materialization. Context is
/// limited to `center`'s own already-fixed neighbors (never recursively
/// re-derived further out), matching the "two-patch radius" determinism
/// contract.
pub fn sample_provisional(
    center: PatchCoord,
    patch_size: u32,
    scent_dims: u32,
    color_dims: u32,
    fixed_neighbors: &[(PatchCoord, Vec<PatchItem>)],
    items: &[ItemType],
    registry: &Registry,
    seed: u64,
    mcmc_iterations: u32,
) -> Patch {
    let mut patch = materialize_fixed(
        center,
        patch_size,
        scent_dims,
        color_dims,
        fixed_neighbors,
        items,
        registry,
        seed,
        mcmc_iterations,
    );
    patch.fixed = false;
    patch
}

#[allow(clippy::too_many_arguments)]
fn gibbs_update_cell(
    canvas: &mut WorkingCanvas,
    center: PatchCoord,
    lx: u32,
    ly: u32,
    items: &[ItemType],
    registry: &Registry,
    seed: u64,
    iteration: u32,
    cell_index: u32,
) {
    let (gx, gy) = canvas.global_cell(center, lx, ly);

    // Energy for "empty" is zero by convention: no intensity, no interaction.
    let mut energies = Vec::with_capacity(items.len() + 1);
    energies.push(0.0f32);

    for (t_idx, item_type) in items.iter().enumerate() {
        let this_id = ItemTypeId(t_idx as u16);
        let mut e = registry.eval_intensity(&item_type.intensity_fn, gx, gy);
        for ly2 in 0..canvas.side {
            for lx2 in 0..canvas.side {
                if lx2 == lx && ly2 == ly {
                    continue;
                }
                let other_idx = canvas.index(lx2, ly2);
                let Some(other_type) = canvas.occupancy[other_idx] else { continue };
                if let Some(interaction) = item_type.interaction_fn.get(&other_type) {
                    let (ox, oy) = canvas.global_cell(center, lx2, ly2);
                    e += registry.eval_interaction(interaction, gx, gy, ox, oy);
                } else if other_type == this_id {
                    // symmetric self-interaction when stored only on one side
                    if let Some(other_item) = items.get(other_type.index()) {
                        if let Some(interaction) = other_item.interaction_fn.get(&this_id) {
                            let (ox, oy) = canvas.global_cell(center, lx2, ly2);
                            e += registry.eval_interaction(interaction, gx, gy, ox, oy);
                        }
                    }
                }
            }
        }
        energies.push(e);
    }

    let weights: Vec<f64> = energies.iter().map(|&e| (-e as f64).exp()).collect();
    let mut rng = GibbsRng::new(seed, center.px, center.py, iteration, cell_index);
    let choice = rng.weighted_index(&weights).unwrap_or(0);

    let idx = canvas.index(lx, ly);
    canvas.occupancy[idx] = if choice == 0 { None } else { Some(ItemTypeId((choice - 1) as u16)) };
}
