//! Scent diffusion, decay, and removed-item afterglow.

use jbw_core::{ItemType, Tick};

use crate::patch::Patch;

/// Gives the scent field update access to a neighboring patch's current
/// scent at a specific cell, without requiring the whole store to be
/// borrowed mutably. `None` means the neighboring cell lies in a patch
/// that does not yet exist — treated as zero scent, the same as any
/// other un-materialized region of the infinite grid.
pub trait ScentLookup {
    fn scent_at(&self, gx: i64, gy: i64) -> Option<Vec<f32>>;
}

/// Advance `patch`'s scent field from `patch.last_advanced_tick` up to
/// `target_tick`, one tick at a time.
///
/// A patch outside the active set simply accumulates a backlog here;
/// there is no closed-form shortcut, so this runs the ordinary per-tick
/// update in a loop.
pub fn catch_up(
    patch: &mut Patch,
    lookup: &dyn ScentLookup,
    items: &[ItemType],
    decay: f32,
    diffusion: f32,
    deleted_item_lifetime: u32,
    target_tick: Tick,
) {
    while patch.last_advanced_tick < target_tick {
        let next = patch.last_advanced_tick.next();
        advance_one_tick(patch, lookup, items, decay, diffusion, deleted_item_lifetime, next);
        patch.last_advanced_tick = next;
    }
}

fn advance_one_tick(
    patch: &mut Patch,
    lookup: &dyn ScentLookup,
    items: &[ItemType],
    decay: f32,
    diffusion: f32,
    deleted_item_lifetime: u32,
    now: Tick,
) {
    let n = patch.patch_size;
    let s = patch.scent_dims as usize;
    let mut next = vec![0.0f32; patch.scent.len()];

    for ly in 0..n {
        for lx in 0..n {
            let old = patch.scent_at((lx, ly));
            let gx = patch.coord.px * n as i64 + lx as i64;
            let gy = patch.coord.py * n as i64 + ly as i64;

            let mut diffusion_sum = vec![0.0f32; s];
            for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                let neighbor = neighbor_scent(patch, lookup, lx as i64 + dx, ly as i64 + dy, gx + dx, gy + dy);
                for d in 0..s {
                    diffusion_sum[d] += neighbor[d] - old[d];
                }
            }

            let base = patch.cell_index((lx, ly)) * s;
            for d in 0..s {
                next[base + d] = (decay * old[d] + diffusion * diffusion_sum[d]).max(0.0);
            }

            if let Some(item) = patch.item_at((lx, ly)) {
                if let Some(def) = items.get(item.item_type.index()) {
                    for d in 0..s.min(def.scent_vec.len()) {
                        next[base + d] += def.scent_vec[d];
                    }
                }
            }

            for removed in &patch.removed_items {
                if removed.local != (lx, ly) {
                    continue;
                }
                let age = now - removed.deletion_tick;
                if age >= deleted_item_lifetime as u64 {
                    continue;
                }
                if let Some(def) = items.get(removed.item_type.index()) {
                    let fade = 1.0 - (age as f32 / deleted_item_lifetime.max(1) as f32);
                    for d in 0..s.min(def.scent_vec.len()) {
                        next[base + d] += def.scent_vec[d] * fade;
                    }
                }
            }

            for v in &mut next[base..base + s] {
                if !v.is_finite() || *v < 0.0 {
                    *v = 0.0;
                }
            }
        }
    }

    patch.scent = next;
}

/// Scent at local-or-cross-boundary cell `(local_x, local_y)` within
/// `patch`'s own coordinate frame; falls back to `lookup` when the
/// neighbor cell crosses into an adjacent patch.
fn neighbor_scent(patch: &Patch, lookup: &dyn ScentLookup, local_x: i64, local_y: i64, gx: i64, gy: i64) -> Vec<f32> {
    let n = patch.patch_size as i64;
    if (0..n).contains(&local_x) && (0..n).contains(&local_y) {
        patch.scent_at((local_x as u32, local_y as u32)).to_vec()
    } else {
        lookup.scent_at(gx, gy).unwrap_or_else(|| vec![0.0; patch.scent_dims as usize])
    }
}
