//! The step state machine: `AwaitingActions -> Resolving ->
//! Broadcasting -> AwaitingActions`.

use std::collections::HashSet;

use jbw_agent::Action;
use jbw_core::{AgentId, JbwError, Position, TickRng};
use jbw_world::World;

use crate::conflict;
use crate::error::CoordinatorResult;
use crate::observer::StepObserver;

/// Where the global step machine currently stands. `Resolving` never
/// observably outlasts a single [`StepCoordinator::try_resolve`] call — it
/// runs to completion without suspension — but the field still models
/// it so a caller mid-resolve (e.g. a panic-safety audit) can tell.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CoordinatorPhase {
    AwaitingActions,
    Resolving,
    Broadcasting,
}

/// Drives one [`World`] through its tick lifecycle: collects actions,
/// detects when every required agent has submitted, and resolves the tick.
pub struct StepCoordinator {
    phase: CoordinatorPhase,
    /// Agents whose action is required before this tick can resolve —
    /// snapshotted from `World`'s active set at the start of the tick, so
    /// a `set_active(false)` mid-tick doesn't shrink the requirement the
    /// current tick already locked in.
    required: HashSet<AgentId>,
    /// Order agents' actions arrived this tick, for `FirstComeFirstServed`.
    submission_order: Vec<AgentId>,
    seed: u64,
}

impl StepCoordinator {
    pub fn new(seed: u64) -> Self {
        StepCoordinator {
            phase: CoordinatorPhase::AwaitingActions,
            required: HashSet::new(),
            submission_order: Vec::new(),
            seed,
        }
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    /// Snapshot the active set as this tick's required-set, if not already
    /// done. Idempotent — calling it again mid-tick has no effect, so a new
    /// agent (or `set_active(true)`) added mid-tick is picked up starting
    /// *next* tick rather than the one in progress.
    fn ensure_required_set(&mut self, world: &World) {
        if self.required.is_empty() && self.submission_order.is_empty() {
            self.required = world.agents.active_agent_ids().into_iter().collect();
        }
    }

    /// Submit one agent's action for the current tick. Fails with
    /// `AgentAlreadyActed` on a second submission in the same tick, exactly
    /// as [`World::submit_action`] does — the coordinator only adds
    /// required-set/submission-order bookkeeping on top.
    pub fn submit_action(&mut self, world: &mut World, agent: AgentId, action: Action) -> CoordinatorResult<()> {
        self.ensure_required_set(world);
        world.submit_action(agent, action)?;
        if !self.submission_order.contains(&agent) {
            self.submission_order.push(agent);
        }
        self.required.insert(agent);
        Ok(())
    }

    /// `true` once every currently-required agent has a pending action —
    /// the `AwaitingActions -> Resolving` trigger condition.
    pub fn ready_to_resolve(&self, world: &World) -> bool {
        if self.required.is_empty() {
            return false;
        }
        self.required.iter().all(|&a| world.has_acted(a).unwrap_or(false))
    }

    /// Resolve the tick if every required agent has submitted; otherwise a
    /// no-op returning `Ok(None)`. On resolve: applies turns, resolves
    /// movement conflicts, processes collection, advances the scent field,
    /// refreshes caches, increments the clock, clears pending actions, and
    /// invokes `observer.on_step` with every owned agent's post-resolve
    /// state.
    pub fn try_resolve<O: StepObserver>(
        &mut self,
        world: &mut World,
        observer: &mut O,
    ) -> CoordinatorResult<bool> {
        if !self.ready_to_resolve(world) {
            return Ok(false);
        }
        self.phase = CoordinatorPhase::Resolving;

        let required: Vec<AgentId> = self.required.iter().copied().collect();

        // Step 1: turns apply first, purely local.
        for &agent in &required {
            if let Err(JbwError::InvalidAgentId(_)) = world.apply_turn(agent) {
                continue; // removed mid-tick; simply excluded from this resolve
            }
        }

        // Step 2: collect movement destinations, partition into movers and
        // agents that aren't relocating this tick (no action, a turn/no-op,
        // or a move whose path is blocked by terrain).
        let mut movers = Vec::new();
        let mut stationary = HashSet::new();
        let mut current_of: std::collections::HashMap<AgentId, Position> = std::collections::HashMap::new();
        for &agent in &required {
            let dest = match world.intended_destination(agent) {
                Ok(d) => d,
                Err(JbwError::InvalidAgentId(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            let current = match world.agent_state(agent) {
                Ok(s) => s.position,
                Err(JbwError::InvalidAgentId(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            current_of.insert(agent, current);
            match dest {
                Some(d) => movers.push((agent, current, d)),
                None => {
                    stationary.insert(current);
                }
            }
        }

        let mut tick_rng = TickRng::new(self.seed, world.clock.0);
        let resolved =
            conflict::resolve_moves(&movers, &stationary, &self.submission_order, world.config.movement_conflict_policy, &mut tick_rng);

        // Step 3: item collection in final-position order. Every required
        // agent is processed, not just movers — one that stayed put (no
        // action, a turn, or a blocked move) can still be sitting on a
        // collectible item. Sorted by agent id for determinism, since the
        // required-set is a `HashSet` with no stable iteration order.
        let mut final_positions: Vec<(AgentId, Position)> = current_of
            .into_iter()
            .map(|(agent, current)| (agent, resolved.get(&agent).copied().unwrap_or(current)))
            .collect();
        final_positions.sort_by_key(|(agent, _)| agent.get());
        for (agent, pos) in &final_positions {
            if let Err(e) = world.apply_move_and_collect(*agent, *pos) {
                if !matches!(e, JbwError::InvalidAgentId(_)) {
                    return Err(e.into());
                }
            }
        }

        // Step 4: advance the scent field around every agent that acted.
        let active_positions: Vec<Position> = final_positions.iter().map(|(_, p)| *p).collect();
        world.advance_scent_field(&active_positions);

        // Step 5: refresh caches.
        let mut states = Vec::with_capacity(required.len());
        for &agent in &required {
            if world.refresh_caches(agent).is_err() {
                continue; // removed mid-tick
            }
            if let Ok(state) = world.agent_state(agent) {
                states.push((agent, state));
            }
        }

        // Step 7: pending_action cleared as part of the next tick's first
        // submission per agent (has_acted() reads pending_action, cleared
        // implicitly by overwriting it) — done explicitly here instead so
        // a quiet agent's slate is clean even if it never re-submits.
        for &agent in &required {
            let _ = world.clear_pending_action(agent);
        }

        self.phase = CoordinatorPhase::Broadcasting;
        states.sort_by_key(|(agent, _)| agent.get());
        observer.on_step(world.clock, &states);

        self.required.clear();
        self.submission_order.clear();
        self.phase = CoordinatorPhase::AwaitingActions;
        Ok(true)
    }
}
