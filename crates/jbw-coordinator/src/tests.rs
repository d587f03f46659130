use std::collections::HashMap;

use jbw_agent::{Action, AgentState};
use jbw_core::{
    AgentId, Direction, DirectionPolicies, IntensityFn, ItemType, JbwError, MovementConflictPolicy, Position, Tick,
    TurnPolicies, WorldConfig,
};
use jbw_world::World;

use crate::{CoordinatorError, NoopObserver, StepCoordinator, StepObserver};

fn item(name: &str, intensity: f32, blocks_movement: bool) -> ItemType {
    ItemType {
        name: name.into(),
        scent_vec: vec![1.0],
        color_vec: vec![1.0, 0.0, 0.0],
        required_counts: vec![0],
        required_costs: vec![0],
        blocks_movement,
        intensity_fn: IntensityFn::constant(intensity),
        interaction_fn: HashMap::new(),
    }
}

/// An "empty world" config: the item option is so energetically
/// unfavorable that `exp(-E)` for it is negligible next to "empty"'s
/// `exp(0) == 1`, so no patch ever places one in practice.
fn empty_world_config(seed: u64, policy: MovementConflictPolicy) -> WorldConfig {
    WorldConfig {
        patch_size: 8,
        vision_radius: 1,
        scent_dims: 1,
        color_dims: 3,
        items: vec![item("bean", 1000.0, false)],
        mcmc_iterations: 2,
        scent_decay: 0.5,
        scent_diffusion: 0.1,
        deleted_item_lifetime: 10,
        movement_conflict_policy: policy,
        direction_policies: DirectionPolicies::default(),
        turn_policies: TurnPolicies::default(),
        seed,
    }
}

/// A "dense world" config: the opposite extreme, so every nearby
/// cell is overwhelmingly likely to hold the item.
fn dense_world_config(seed: u64) -> WorldConfig {
    WorldConfig {
        patch_size: 8,
        vision_radius: 1,
        scent_dims: 1,
        color_dims: 3,
        items: vec![item("jelly", -20.0, false)],
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

fn place(world: &World, agent: AgentId, pos: Position) {
    let lock = world.agents.lock_handle(agent).unwrap();
    lock.lock().unwrap().position = pos;
}

struct RecordingObserver {
    calls: Vec<(Tick, Vec<(AgentId, AgentState)>)>,
}

impl StepObserver for RecordingObserver {
    fn on_step(&mut self, tick: Tick, states: &[(AgentId, AgentState)]) {
        self.calls.push((tick, states.to_vec()));
    }
}

#[test]
fn collision_both_agents_stay_put_under_no_collisions() {
    let cfg = empty_world_config(1, MovementConflictPolicy::NoCollisions);
    let mut world = World::new(cfg).unwrap();
    let mut coord = StepCoordinator::new(1);

    let a = world.add_agent();
    let b = world.add_agent();
    place(&world, a, Position::new(0, 0));
    place(&world, b, Position::new(0, 2));

    coord.submit_action(&mut world, a, Action::Move { dir: Direction::Up, steps: 1 }).unwrap();
    coord.submit_action(&mut world, b, Action::Move { dir: Direction::Down, steps: 1 }).unwrap();

    let mut observer = NoopObserver;
    assert!(coord.try_resolve(&mut world, &mut observer).unwrap());

    assert_eq!(world.agent_state(a).unwrap().position, Position::new(0, 0));
    assert_eq!(world.agent_state(b).unwrap().position, Position::new(0, 2));
}

#[test]
fn first_come_first_served_lets_the_earlier_submission_win() {
    let cfg = empty_world_config(1, MovementConflictPolicy::FirstComeFirstServed);
    let mut world = World::new(cfg).unwrap();
    let mut coord = StepCoordinator::new(1);

    let a = world.add_agent();
    let b = world.add_agent();
    place(&world, a, Position::new(0, 0));
    place(&world, b, Position::new(0, 2));

    coord.submit_action(&mut world, a, Action::Move { dir: Direction::Up, steps: 1 }).unwrap();
    coord.submit_action(&mut world, b, Action::Move { dir: Direction::Down, steps: 1 }).unwrap();

    let mut observer = NoopObserver;
    assert!(coord.try_resolve(&mut world, &mut observer).unwrap());

    assert_eq!(world.agent_state(a).unwrap().position, Position::new(0, 1));
    assert_eq!(world.agent_state(b).unwrap().position, Position::new(0, 2));
}

#[test]
fn collection_updates_inventory_and_removes_the_item() {
    let cfg = dense_world_config(7);
    let mut world = World::new(cfg).unwrap();
    let mut coord = StepCoordinator::new(7);
    let agent = world.add_agent();
    place(&world, agent, Position::new(0, 0));

    let start = Position::new(0, 0);
    let mut chosen = None;
    for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
        let probe = start.step(dir);
        if world.item_at(probe).is_some() {
            chosen = Some(dir);
            break;
        }
    }
    let dir = chosen.expect("a heavily favored item type should occupy an adjacent cell");
    let destination = start.step(dir);

    coord.submit_action(&mut world, agent, Action::Move { dir, steps: 1 }).unwrap();
    let mut observer = NoopObserver;
    assert!(coord.try_resolve(&mut world, &mut observer).unwrap());

    let state = world.agent_state(agent).unwrap();
    assert_eq!(state.position, destination);
    assert_eq!(state.inventory[0], 1);
    assert!(world.item_at(destination).is_none());
}

#[test]
fn second_submission_in_the_same_tick_fails_already_acted() {
    let cfg = empty_world_config(3, MovementConflictPolicy::NoCollisions);
    let mut world = World::new(cfg).unwrap();
    let mut coord = StepCoordinator::new(3);
    let agent = world.add_agent();

    coord.submit_action(&mut world, agent, Action::NoOp).unwrap();
    let err = coord.submit_action(&mut world, agent, Action::NoOp).unwrap_err();
    assert!(matches!(err, CoordinatorError::World(JbwError::AgentAlreadyActed(_))));
}

#[test]
fn try_resolve_is_a_no_op_until_every_required_agent_has_submitted() {
    let cfg = empty_world_config(9, MovementConflictPolicy::NoCollisions);
    let mut world = World::new(cfg).unwrap();
    let mut coord = StepCoordinator::new(9);
    let a = world.add_agent();
    let b = world.add_agent();

    coord.submit_action(&mut world, a, Action::NoOp).unwrap();
    let mut observer = NoopObserver;
    assert!(!coord.try_resolve(&mut world, &mut observer).unwrap());

    coord.submit_action(&mut world, b, Action::NoOp).unwrap();
    assert!(coord.try_resolve(&mut world, &mut observer).unwrap());
}

#[test]
fn resolve_advances_the_clock_and_invokes_the_step_observer_once() {
    let cfg = empty_world_config(5, MovementConflictPolicy::NoCollisions);
    let mut world = World::new(cfg).unwrap();
    let mut coord = StepCoordinator::new(5);
    let agent = world.add_agent();

    coord.submit_action(&mut world, agent, Action::NoOp).unwrap();
    let mut observer = RecordingObserver { calls: Vec::new() };
    assert!(coord.try_resolve(&mut world, &mut observer).unwrap());

    assert_eq!(world.clock, Tick(1));
    assert_eq!(observer.calls.len(), 1);
    assert_eq!(observer.calls[0].0, Tick(1));
    assert_eq!(observer.calls[0].1.len(), 1);
    assert_eq!(observer.calls[0].1[0].0, agent);
}
