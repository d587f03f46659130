use std::collections::HashMap;

use jbw_agent::Action;
use jbw_core::{
    Direction, DirectionPolicies, IntensityFn, ItemType, MovementConflictPolicy, PatchCoord, Position, Registry,
    TurnPolicies, WorldConfig,
};

use crate::store::PatchStore;
use crate::world::World;

fn item(name: &str, blocks_movement: bool) -> ItemType {
    ItemType {
        name: name.into(),
        scent_vec: vec![1.0],
        color_vec: vec![1.0, 0.0, 0.0],
        required_counts: vec![0],
        required_costs: vec![0],
        blocks_movement,
        intensity_fn: IntensityFn::constant(2.0),
        interaction_fn: HashMap::new(),
    }
}

fn test_config(seed: u64) -> WorldConfig {
    WorldConfig {
        patch_size: 8,
        vision_radius: 2,
        scent_dims: 1,
        color_dims: 3,
        items: vec![item("jellybean", false)],
        mcmc_iterations: 2,
        scent_decay: 0.5,
        scent_diffusion: 0.1,
        deleted_item_lifetime: 10,
        movement_conflict_policy: MovementConflictPolicy::NoCollisions,
        direction_policies: DirectionPolicies::default(),
        turn_policies: TurnPolicies::default(),
        seed,
    }
}

#[test]
fn patch_materialization_is_deterministic_for_a_fixed_seed() {
    let cfg = test_config(42);
    let registry = Registry::new();

    let mut store_a = PatchStore::new();
    let patch_a = store_a.get_fixed_patch(PatchCoord::new(0, 0), &cfg, &registry);
    let items_a: Vec<_> = patch_a.items.clone();

    let mut store_b = PatchStore::new();
    let patch_b = store_b.get_fixed_patch(PatchCoord::new(0, 0), &cfg, &registry);
    let items_b: Vec<_> = patch_b.items.clone();

    assert_eq!(items_a.len(), items_b.len());
    for (a, b) in items_a.iter().zip(items_b.iter()) {
        assert_eq!(a.local, b.local);
        assert_eq!(a.item_type, b.item_type);
    }
}

#[test]
fn different_seeds_need_not_agree() {
    let registry = Registry::new();
    let mut store_a = PatchStore::new();
    let patch_a = store_a.get_fixed_patch(PatchCoord::new(0, 0), &test_config(1), &registry);
    let a_items = patch_a.items.len();

    let mut store_b = PatchStore::new();
    let patch_b = store_b.get_fixed_patch(PatchCoord::new(0, 0), &test_config(2), &registry);
    let b_items = patch_b.items.len();

    // Not asserting inequality (they could coincidentally match); just
    // confirming both seeds produce a well-formed, boundedly-sized patch.
    assert!(a_items <= 64);
    assert!(b_items <= 64);
}

#[test]
fn world_add_agent_spawns_on_an_unblocked_cell() {
    let cfg = test_config(7);
    let mut world = World::new(cfg).unwrap();
    let agent = world.add_agent();
    assert!(world.agents.contains(agent));

    let spawn = {
        let lock = world.agents.lock_handle(agent).unwrap();
        lock.lock().unwrap().position
    };
    assert!(!world.cell_blocks_movement(spawn));
}

#[test]
fn disallowed_direction_rejects_submission() {
    let mut cfg = test_config(7);
    cfg.direction_policies.up = jbw_core::ActionPolicy::Disallowed;
    let mut world = World::new(cfg).unwrap();
    let agent = world.add_agent();

    let err = world.submit_action(agent, Action::Move { dir: Direction::Up, steps: 1 }).unwrap_err();
    assert!(matches!(err, jbw_core::JbwError::ActionDisallowed { .. }));
}

#[test]
fn ignored_direction_downgrades_to_noop_silently() {
    let mut cfg = test_config(7);
    cfg.direction_policies.up = jbw_core::ActionPolicy::Ignored;
    let mut world = World::new(cfg).unwrap();
    let agent = world.add_agent();

    world.submit_action(agent, Action::Move { dir: Direction::Up, steps: 1 }).unwrap();
    let lock = world.agents.lock_handle(agent).unwrap();
    let guard = lock.lock().unwrap();
    assert_eq!(guard.pending_action, Some(Action::NoOp));
}

#[test]
fn agent_already_acted_rejects_second_submission() {
    let cfg = test_config(7);
    let mut world = World::new(cfg).unwrap();
    let agent = world.add_agent();

    world.submit_action(agent, Action::NoOp).unwrap();
    let err = world.submit_action(agent, Action::NoOp).unwrap_err();
    assert!(matches!(err, jbw_core::JbwError::AgentAlreadyActed(_)));
}

#[test]
fn collecting_a_non_blocking_item_updates_inventory_and_removes_it() {
    // A constant-intensity single item type with no interactions saturates
    // nearly every cell, so scanning outward from the origin is certain to
    // find an occupied one quickly.
    let mut cfg = test_config(7);
    cfg.items = vec![item("bean", false)];
    let mut world = World::new(cfg).unwrap();
    let agent = world.add_agent();

    let mut occupied = None;
    'search: for y in -4..=4 {
        for x in -4..=4 {
            let pos = Position::new(x, y);
            if world.item_at(pos).is_some() {
                occupied = Some(pos);
                break 'search;
            }
        }
    }
    let pos = occupied.expect("a constant-intensity item type should occupy some nearby cell");

    world.apply_move_and_collect(agent, pos).unwrap();

    let lock = world.agents.lock_handle(agent).unwrap();
    let inv = lock.lock().unwrap().inventory.clone();
    assert_eq!(inv[0], 1);
    assert!(world.item_at(pos).is_none());
}

#[test]
fn scent_field_advance_increments_clock_once_per_call() {
    let cfg = test_config(7);
    let mut world = World::new(cfg).unwrap();
    world.get_fixed_patch(PatchCoord::new(0, 0));
    let before = world.clock;
    world.advance_scent_field(&[Position::new(0, 0)]);
    assert_eq!(world.clock, before.next());
}

#[test]
fn scent_stays_non_negative_and_finite_after_several_ticks() {
    let cfg = test_config(7);
    let mut world = World::new(cfg).unwrap();
    world.get_fixed_patch(PatchCoord::new(0, 0));
    for _ in 0..5 {
        world.advance_scent_field(&[Position::new(0, 0)]);
    }
    let patch = world.get_fixed_patch(PatchCoord::new(0, 0));
    for &v in &patch.scent {
        assert!(v.is_finite());
        assert!(v >= 0.0);
    }
}
