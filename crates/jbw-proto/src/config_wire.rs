//! Wire encoding of `WorldConfig` — the `config-block` carried by the
//! CONNECT response and, unchanged, the snapshot file's config-block
//!. Kept in one place so both callers agree on
//! exactly one layout.

use jbw_core::{
    ActionPolicy, DirectionPolicies, InteractionFn, IntensityFn, ItemType, ItemTypeId, MovementConflictPolicy,
    TurnPolicies, WorldConfig,
};

use crate::error::{ProtoError, ProtoResult};
use crate::wire::{ByteReader, ByteWriter};

fn write_action_policy(w: &mut ByteWriter, p: ActionPolicy) {
    w.u8(match p {
        ActionPolicy::Allowed => 0,
        ActionPolicy::Disallowed => 1,
        ActionPolicy::Ignored => 2,
    });
}

fn read_action_policy(r: &mut ByteReader) -> ProtoResult<ActionPolicy> {
    let tag = r.u8()?;
    Ok(match tag {
        0 => ActionPolicy::Allowed,
        1 => ActionPolicy::Disallowed,
        2 => ActionPolicy::Ignored,
        _ => return Err(ProtoError::InvalidActionPolicy(tag)),
    })
}

fn write_direction_policies(w: &mut ByteWriter, p: &DirectionPolicies) {
    write_action_policy(w, p.up);
    write_action_policy(w, p.down);
    write_action_policy(w, p.left);
    write_action_policy(w, p.right);
}

fn read_direction_policies(r: &mut ByteReader) -> ProtoResult<DirectionPolicies> {
    Ok(DirectionPolicies {
        up: read_action_policy(r)?,
        down: read_action_policy(r)?,
        left: read_action_policy(r)?,
        right: read_action_policy(r)?,
    })
}

fn write_turn_policies(w: &mut ByteWriter, p: &TurnPolicies) {
    write_action_policy(w, p.no_change);
    write_action_policy(w, p.reverse);
    write_action_policy(w, p.left);
    write_action_policy(w, p.right);
}

fn read_turn_policies(r: &mut ByteReader) -> ProtoResult<TurnPolicies> {
    Ok(TurnPolicies {
        no_change: read_action_policy(r)?,
        reverse: read_action_policy(r)?,
        left: read_action_policy(r)?,
        right: read_action_policy(r)?,
    })
}

fn write_conflict_policy(w: &mut ByteWriter, p: MovementConflictPolicy) {
    w.u8(match p {
        MovementConflictPolicy::NoCollisions => 0,
        MovementConflictPolicy::FirstComeFirstServed => 1,
        MovementConflictPolicy::Random => 2,
    });
}

fn read_conflict_policy(r: &mut ByteReader) -> ProtoResult<MovementConflictPolicy> {
    let tag = r.u8()?;
    Ok(match tag {
        0 => MovementConflictPolicy::NoCollisions,
        1 => MovementConflictPolicy::FirstComeFirstServed,
        2 => MovementConflictPolicy::Random,
        _ => return Err(ProtoError::InvalidConflictPolicy(tag)),
    })
}

fn write_intensity_fn(w: &mut ByteWriter, f: &IntensityFn) {
    w.u16(f.id);
    w.f32_vec(&f.args);
}

fn read_intensity_fn(r: &mut ByteReader) -> ProtoResult<IntensityFn> {
    let id = r.u16()?;
    let args = r.f32_vec()?;
    Ok(IntensityFn { id, args })
}

fn write_interaction_fn(w: &mut ByteWriter, f: &InteractionFn) {
    w.u16(f.id);
    w.u16(f.target_item.0);
    w.f32_vec(&f.args);
}

fn read_interaction_fn(r: &mut ByteReader) -> ProtoResult<InteractionFn> {
    let id = r.u16()?;
    let target_item = ItemTypeId(r.u16()?);
    let args = r.f32_vec()?;
    Ok(InteractionFn { id, target_item, args })
}

fn write_item_type(w: &mut ByteWriter, item: &ItemType) {
    w.string(&item.name);
    w.f32_vec(&item.scent_vec);
    w.f32_vec(&item.color_vec);
    w.u32_vec(&item.required_counts);
    w.u32_vec(&item.required_costs);
    w.u8(item.blocks_movement as u8);
    write_intensity_fn(w, &item.intensity_fn);
    w.u32(item.interaction_fn.len() as u32);
    // Sorted by target item id so the encoding is deterministic across
    // the `HashMap`'s unspecified iteration order.
    let mut entries: Vec<_> = item.interaction_fn.values().collect();
    entries.sort_by_key(|f| f.target_item.0);
    for f in entries {
        write_interaction_fn(w, f);
    }
}

fn read_item_type(r: &mut ByteReader) -> ProtoResult<ItemType> {
    let name = r.string()?;
    let scent_vec = r.f32_vec()?;
    let color_vec = r.f32_vec()?;
    let required_counts = r.u32_vec()?;
    let required_costs = r.u32_vec()?;
    let blocks_movement = r.u8()? != 0;
    let intensity_fn = read_intensity_fn(r)?;
    let count = r.u32()? as usize;
    let mut interaction_fn = std::collections::HashMap::with_capacity(count);
    for _ in 0..count {
        let f = read_interaction_fn(r)?;
        interaction_fn.insert(f.target_item, f);
    }
    Ok(ItemType { name, scent_vec, color_vec, required_counts, required_costs, blocks_movement, intensity_fn, interaction_fn })
}

pub fn write_world_config(w: &mut ByteWriter, cfg: &WorldConfig) {
    w.u32(cfg.patch_size);
    w.u32(cfg.vision_radius);
    w.u32(cfg.scent_dims);
    w.u32(cfg.color_dims);
    w.u32(cfg.items.len() as u32);
    for item in &cfg.items {
        write_item_type(w, item);
    }
    w.u32(cfg.mcmc_iterations);
    w.f32(cfg.scent_decay);
    w.f32(cfg.scent_diffusion);
    w.u32(cfg.deleted_item_lifetime);
    write_conflict_policy(w, cfg.movement_conflict_policy);
    write_direction_policies(w, &cfg.direction_policies);
    write_turn_policies(w, &cfg.turn_policies);
    w.u64(cfg.seed);
}

pub fn read_world_config(r: &mut ByteReader) -> ProtoResult<WorldConfig> {
    let patch_size = r.u32()?;
    let vision_radius = r.u32()?;
    let scent_dims = r.u32()?;
    let color_dims = r.u32()?;
    let item_count = r.u32()? as usize;
    let mut items = Vec::with_capacity(item_count);
    for _ in 0..item_count {
        items.push(read_item_type(r)?);
    }
    let mcmc_iterations = r.u32()?;
    let scent_decay = r.f32()?;
    let scent_diffusion = r.f32()?;
    let deleted_item_lifetime = r.u32()?;
    let movement_conflict_policy = read_conflict_policy(r)?;
    let direction_policies = read_direction_policies(r)?;
    let turn_policies = read_turn_policies(r)?;
    let seed = r.u64()?;
    Ok(WorldConfig {
        patch_size,
        vision_radius,
        scent_dims,
        color_dims,
        items,
        mcmc_iterations,
        scent_decay,
        scent_diffusion,
        deleted_item_lifetime,
        movement_conflict_policy,
        direction_policies,
        turn_policies,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jbw_core::item::intensity_ids;
    use jbw_core::item::interaction_ids;

    #[test]
    fn item_catalog_with_interactions_round_trips() {
        let mut jelly = ItemType {
            name: "jelly".into(),
            scent_vec: vec![1.0, 0.0],
            color_vec: vec![0.2, 0.8, 0.1],
            required_counts: vec![0, 0],
            required_costs: vec![0, 0],
            blocks_movement: false,
            intensity_fn: IntensityFn { id: intensity_ids::CONSTANT, args: vec![-2.0] },
            interaction_fn: std::collections::HashMap::new(),
        };
        jelly.interaction_fn.insert(
            ItemTypeId(1),
            InteractionFn { id: interaction_ids::PIECEWISE_BY_DISTANCE, target_item: ItemTypeId(1), args: vec![1.0, -10.0, 0.0] },
        );
        let wall = ItemType {
            name: "wall".into(),
            scent_vec: vec![0.0, 0.0],
            color_vec: vec![0.0, 0.0, 0.0],
            required_counts: vec![0, 0],
            required_costs: vec![0, 0],
            blocks_movement: true,
            intensity_fn: IntensityFn { id: intensity_ids::GAUSSIAN, args: vec![5.0, 2.0] },
            interaction_fn: std::collections::HashMap::new(),
        };

        let cfg = WorldConfig {
            patch_size: 32,
            vision_radius: 3,
            scent_dims: 2,
            color_dims: 3,
            items: vec![jelly, wall],
            mcmc_iterations: 20,
            scent_decay: 0.7,
            scent_diffusion: 0.2,
            deleted_item_lifetime: 10,
            movement_conflict_policy: MovementConflictPolicy::Random,
            direction_policies: DirectionPolicies::default(),
            turn_policies: TurnPolicies::default(),
            seed: 99,
        };

        let mut w = ByteWriter::new();
        write_world_config(&mut w, &cfg);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let decoded = read_world_config(&mut r).unwrap();
        assert_eq!(decoded, cfg);
    }
}
