//! A single materialized `N×N` square of the grid.

use jbw_core::{ItemTypeId, PatchCoord, Tick};

/// One placed item, located by its cell within the owning patch.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatchItem {
    pub item_type: ItemTypeId,
    /// Cell coordinates within the patch, each in `[0, patch_size)`.
    pub local: (u32, u32),
}

/// A record of an item removed from the patch (by collection), retained
/// for `deleted_item_lifetime` ticks to drive scent afterglow.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemovedItem {
    pub local: (u32, u32),
    pub item_type: ItemTypeId,
    pub deletion_tick: Tick,
}

/// A materialized `N×N` region of the grid.
///
/// Invariants upheld by this module and its callers:
/// - At most one `blocks_movement` item occupies any cell — enforced by
///   the Gibbs sampler never placing two items in the same cell at all.
/// - Once `fixed == true`, `items` is only ever appended to or pruned
///   by collection; the patch is never regenerated.
/// - `scent` values are always non-negative and finite — enforced by
///   the scent field update in [`crate::scent`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Patch {
    pub coord: PatchCoord,
    pub patch_size: u32,
    pub scent_dims: u32,
    pub color_dims: u32,
    /// `true` once permanently materialized. `false` patches are
    /// never stored persistently — see [`crate::store::PatchStore`].
    pub fixed: bool,
    pub items: Vec<PatchItem>,
    /// Row-major `N*N*S` scent tensor: cell `(x, y)` dimension `s` is at
    /// `((y * N + x) * S + s)`.
    pub scent: Vec<f32>,
    /// Row-major `N*N*C` vision/color tensor, same indexing scheme as `scent`.
    pub vision: Vec<f32>,
    pub removed_items: Vec<RemovedItem>,
    /// Last tick at which the scent field was advanced for this patch.
    /// Patches outside the active set fall behind and are caught up lazily
    /// rather than advanced every tick regardless of observation.
    pub last_advanced_tick: Tick,
}

impl Patch {
    pub fn new_empty(coord: PatchCoord, patch_size: u32, scent_dims: u32, color_dims: u32, fixed: bool) -> Self {
        let cells = (patch_size * patch_size) as usize;
        Patch {
            coord,
            patch_size,
            scent_dims,
            color_dims,
            fixed,
            items: Vec::new(),
            scent: vec![0.0; cells * scent_dims as usize],
            vision: vec![0.0; cells * color_dims as usize],
            removed_items: Vec::new(),
            last_advanced_tick: Tick::ZERO,
        }
    }

    #[inline]
    pub fn cell_index(&self, local: (u32, u32)) -> usize {
        (local.1 * self.patch_size + local.0) as usize
    }

    #[inline]
    pub fn scent_at(&self, local: (u32, u32)) -> &[f32] {
        let base = self.cell_index(local) * self.scent_dims as usize;
        &self.scent[base..base + self.scent_dims as usize]
    }

    #[inline]
    pub fn scent_at_mut(&mut self, local: (u32, u32)) -> &mut [f32] {
        let idx = self.cell_index(local);
        let dims = self.scent_dims as usize;
        let base = idx * dims;
        &mut self.scent[base..base + dims]
    }

    #[inline]
    pub fn vision_at(&self, local: (u32, u32)) -> &[f32] {
        let base = self.cell_index(local) * self.color_dims as usize;
        &self.vision[base..base + self.color_dims as usize]
    }

    #[inline]
    pub fn vision_at_mut(&mut self, local: (u32, u32)) -> &mut [f32] {
        let idx = self.cell_index(local);
        let dims = self.color_dims as usize;
        let base = idx * dims;
        &mut self.vision[base..base + dims]
    }

    /// The item occupying `local`, if any.
    pub fn item_at(&self, local: (u32, u32)) -> Option<&PatchItem> {
        self.items.iter().find(|it| it.local == local)
    }

    /// Remove the item at `local`, recording it in `removed_items`. Returns the removed item's type, if one was present.
    pub fn collect_item_at(&mut self, local: (u32, u32), now: Tick) -> Option<ItemTypeId> {
        let idx = self.items.iter().position(|it| it.local == local)?;
        let removed = self.items.remove(idx);
        self.removed_items.push(RemovedItem {
            local: removed.local,
            item_type: removed.item_type,
            deletion_tick: now,
        });
        Some(removed.item_type)
    }

    /// Recompute the vision/color tensor from the current item list. Call
    /// after any mutation of `items` (Gibbs materialization or collection).
    /// `catalog` is indexed by `ItemTypeId::index()`.
    pub fn rebuild_vision(&mut self, catalog: &[jbw_core::ItemType]) {
        self.vision.iter_mut().for_each(|v| *v = 0.0);
        let dims = self.color_dims as usize;
        for item in &self.items {
            let idx = self.cell_index(item.local);
            let dst = idx * dims;
            if let Some(entry) = catalog.get(item.item_type.index()) {
                for (d, &c) in entry.color_vec.iter().take(dims).enumerate() {
                    self.vision[dst + d] = c;
                }
            }
        }
    }

    /// Drop removed-item entries older than `lifetime` ticks.
    pub fn compact_removed_items(&mut self, now: Tick, lifetime: u32) {
        self.removed_items.retain(|r| (now - r.deletion_tick) < lifetime as u64);
    }
}
