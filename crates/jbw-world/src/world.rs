//! Composes the patch store, Gibbs sampler, scent field, and agent
//! registry into the one API the coordinator and server talk to.

use jbw_agent::{Action, AgentRegistry};
use jbw_core::{
    AgentId, Direction, JbwError, JbwResult, ItemTypeId, MovementConflictPolicy, PatchCoord, Position, Registry, Tick,
    TurnDirection, WorldConfig,
};

use crate::patch::Patch;
use crate::scent;
use crate::store::{PatchStore, StoreScentLookup};

/// A read-only view of one patch, as returned by `get_map`. `scent` is
/// `None` when the caller asked for `include_scent = false`.
pub struct PatchView<'a> {
    pub patch: &'a Patch,
    pub scent: Option<&'a [f32]>,
}

/// The complete simulator world: geometry, items, agents, and the RNG
/// streams that make both deterministic.
pub struct World {
    pub config: WorldConfig,
    pub store: PatchStore,
    pub agents: AgentRegistry,
    pub registry: Registry,
    pub clock: Tick,
}

impl World {
    pub fn new(config: WorldConfig) -> JbwResult<World> {
        config.validate()?;
        let item_count = config.items.len();
        Ok(World {
            agents: AgentRegistry::new(item_count),
            store: PatchStore::new(),
            registry: Registry::new(),
            clock: Tick::ZERO,
            config,
        })
    }

    // ── Patches ───────────────────────────────────────────────────────────

    pub fn get_fixed_patch(&mut self, coord: PatchCoord) -> &Patch {
        self.store.get_fixed_patch(coord, &self.config, &self.registry)
    }

    /// `get_map(bl, tr, include_scent)`. `bl`/`tr` are cell
    /// positions; this materializes every overlapping patch.
    pub fn get_map(&mut self, bl: Position, tr: Position, include_scent: bool) -> Vec<PatchView<'_>> {
        let n = self.config.patch_size;
        let (bl_px, bl_py) = bl.patch_coord(n);
        let (tr_px, tr_py) = tr.patch_coord(n);
        let patches = self
            .store
            .get_map(PatchCoord::new(bl_px, bl_py), PatchCoord::new(tr_px, tr_py), &self.config, &self.registry);
        patches
            .into_iter()
            .map(|p| PatchView { scent: include_scent.then(|| p.scent.as_slice()), patch: p })
            .collect()
    }

    fn locate(&mut self, pos: Position) -> (PatchCoord, (u32, u32)) {
        let n = self.config.patch_size;
        let (px, py) = pos.patch_coord(n);
        let local = pos.cell_in_patch(n);
        (PatchCoord::new(px, py), local)
    }

    pub fn item_at(&mut self, pos: Position) -> Option<ItemTypeId> {
        let (coord, local) = self.locate(pos);
        let patch = self.get_fixed_patch(coord);
        patch.item_at(local).map(|it| it.item_type)
    }

    pub fn cell_blocks_movement(&mut self, pos: Position) -> bool {
        match self.item_at(pos) {
            Some(id) => self.config.items.get(id.index()).map(|it| it.blocks_movement).unwrap_or(false),
            None => false,
        }
    }

    // ── Agents ────────────────────────────────────────────────────────────

    /// Place a new agent at the first free cell found by a square spiral
    /// search outward from the origin. `ADD_AGENT` carries no position in
    /// the wire protocol, so the world chooses one.
    pub fn add_agent(&mut self) -> AgentId {
        let pos = self.find_free_spawn();
        self.agents.add_agent(pos, Direction::Up)
    }

    fn find_free_spawn(&mut self) -> Position {
        let origin = Position::new(0, 0);
        if !self.cell_blocks_movement(origin) && self.agent_at(origin).is_none() {
            return origin;
        }
        for radius in 1..64i64 {
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let candidate = Position::new(dx, dy);
                    if !self.cell_blocks_movement(candidate) && self.agent_at(candidate).is_none() {
                        return candidate;
                    }
                }
            }
        }
        origin
    }

    fn agent_at(&self, pos: Position) -> Option<AgentId> {
        for id in self.agents.agent_ids() {
            if let Ok(lock) = self.agents.lock_handle(id) {
                if lock.lock().unwrap().position == pos {
                    return Some(id);
                }
            }
        }
        None
    }

    pub fn remove_agent(&mut self, id: AgentId) -> JbwResult<()> {
        self.agents.remove_agent(id)
    }

    pub fn has_acted(&self, agent: AgentId) -> JbwResult<bool> {
        let lock = self.agents.lock_handle(agent)?;
        Ok(lock.lock().unwrap().has_acted())
    }

    /// Clear `agent`'s committed action.
    pub fn clear_pending_action(&mut self, agent: AgentId) -> JbwResult<()> {
        let lock = self.agents.lock_handle(agent)?;
        lock.lock().unwrap().pending_action = None;
        Ok(())
    }

    /// Snapshot `agent`'s wire-shaped state, as read by the step
    /// callback and `GET_AGENT_STATES`.
    pub fn agent_state(&self, agent: AgentId) -> JbwResult<jbw_agent::AgentState> {
        let lock = self.agents.lock_handle(agent)?;
        Ok(lock.lock().unwrap().to_state())
    }

    /// Submit `action` for `agent` in the current tick. Enforces
    /// `AgentAlreadyActed` and the configured per-direction/turn
    /// `ActionPolicy`.
    pub fn submit_action(&mut self, agent: AgentId, action: Action) -> JbwResult<()> {
        let effective = self.apply_action_policy(agent, action)?;
        let lock = self.agents.lock_handle(agent)?;
        let mut guard = lock.lock().unwrap();
        if guard.has_acted() {
            return Err(JbwError::AgentAlreadyActed(agent));
        }
        guard.pending_action = Some(effective);
        Ok(())
    }

    /// Resolve `action` against the configured `ActionPolicy`: `Disallowed`
    /// rejects at submission, `Ignored` silently downgrades to a no-op
    ///, `Allowed` passes the action through unchanged.
    fn apply_action_policy(&self, agent: AgentId, action: Action) -> JbwResult<Action> {
        use jbw_core::ActionPolicy;
        let (policy, label) = match action {
            Action::Move { dir, .. } => (
                match dir {
                    Direction::Up => self.config.direction_policies.up,
                    Direction::Down => self.config.direction_policies.down,
                    Direction::Left => self.config.direction_policies.left,
                    Direction::Right => self.config.direction_policies.right,
                },
                "move",
            ),
            Action::Turn { turn } => (
                match turn {
                    TurnDirection::NoChange => self.config.turn_policies.no_change,
                    TurnDirection::Reverse => self.config.turn_policies.reverse,
                    TurnDirection::Left => self.config.turn_policies.left,
                    TurnDirection::Right => self.config.turn_policies.right,
                },
                "turn",
            ),
            Action::NoOp => (ActionPolicy::Allowed, "no_op"),
        };
        if policy.is_disallowed() {
            return Err(JbwError::ActionDisallowed { agent, action: label });
        }
        if policy.is_ignored() {
            return Ok(Action::NoOp);
        }
        Ok(action)
    }

    /// Intended destination cell for `agent`'s pending `Move` action, if
    /// any, ignoring conflicts with other agents (that's the
    /// coordinator's job).
    pub fn intended_destination(&mut self, agent: AgentId) -> JbwResult<Option<Position>> {
        let lock = self.agents.lock_handle(agent)?;
        let (position, action) = {
            let guard = lock.lock().unwrap();
            (guard.position, guard.pending_action)
        };
        match action {
            Some(Action::Move { dir, steps }) => {
                if self.path_clear(position, dir, steps) {
                    Ok(Some(position.step_n(dir, steps)))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    fn path_clear(&mut self, start: Position, dir: Direction, steps: u32) -> bool {
        let mut cur = start;
        for _ in 0..steps {
            cur = cur.step(dir);
            if self.cell_blocks_movement(cur) {
                return false;
            }
        }
        true
    }

    /// Apply a turn in place (Resolving step 1: "turns apply first").
    pub fn apply_turn(&mut self, agent: AgentId) -> JbwResult<()> {
        let lock = self.agents.lock_handle(agent)?;
        let mut guard = lock.lock().unwrap();
        if let Some(Action::Turn { turn }) = guard.pending_action {
            guard.facing = turn.apply(guard.facing);
        }
        Ok(())
    }

    /// Move `agent` to `new_position` (already conflict-resolved by the
    /// coordinator) and process item collection there.
    pub fn apply_move_and_collect(&mut self, agent: AgentId, new_position: Position) -> JbwResult<()> {
        {
            let lock = self.agents.lock_handle(agent)?;
            let mut guard = lock.lock().unwrap();
            guard.position = new_position;
        }
        self.collect_at(agent, new_position)
    }

    fn collect_at(&mut self, agent: AgentId, pos: Position) -> JbwResult<()> {
        let Some(item_id) = self.item_at(pos) else { return Ok(()) };
        let Some(item_def) = self.config.items.get(item_id.index()).cloned() else { return Ok(()) };
        if item_def.blocks_movement {
            return Ok(());
        }

        let lock = self.agents.lock_handle(agent)?;
        let eligible = {
            let guard = lock.lock().unwrap();
            item_def
                .required_counts
                .iter()
                .enumerate()
                .all(|(u, &need)| guard.inventory.get(u).copied().unwrap_or(0) >= need)
        };
        if !eligible {
            return Ok(());
        }

        {
            let mut guard = lock.lock().unwrap();
            for (u, &cost) in item_def.required_costs.iter().enumerate() {
                if let Some(slot) = guard.inventory.get_mut(u) {
                    *slot = slot.saturating_sub(cost);
                }
            }
            if let Some(slot) = guard.inventory.get_mut(item_id.index()) {
                *slot += 1;
            }
        }

        let (coord, local) = self.locate(pos);
        if let Some(patch) = self.store.get_if_fixed_mut(coord) {
            patch.collect_item_at(local, self.clock);
            let items = self.config.items.clone();
            patch.rebuild_vision(&items);
        }
        Ok(())
    }

    /// Refresh `agent`'s scent/vision/inventory caches from the current
    /// world state. Inventory needs no recomputation — it's
    /// already authoritative on the record — only scent and vision are
    /// derived from patch contents.
    pub fn refresh_caches(&mut self, agent: AgentId) -> JbwResult<()> {
        let lock = self.agents.lock_handle(agent)?;
        let (position, radius) = {
            let guard = lock.lock().unwrap();
            (guard.position, self.config.vision_radius)
        };

        let (coord, local) = self.locate(position);
        let scent = self.get_fixed_patch(coord).scent_at(local).to_vec();

        let window = (2 * radius + 1) as usize;
        let mut vision = vec![0.0f32; window * window * self.config.color_dims as usize];
        for dy in -(radius as i64)..=(radius as i64) {
            for dx in -(radius as i64)..=(radius as i64) {
                let cell = Position::new(position.x + dx, position.y + dy);
                let (c, l) = self.locate(cell);
                let patch = self.get_fixed_patch(c);
                let pixel = patch.vision_at(l);
                let wx = (dx + radius as i64) as usize;
                let wy = (dy + radius as i64) as usize;
                let dst = (wy * window + wx) * self.config.color_dims as usize;
                vision[dst..dst + self.config.color_dims as usize].copy_from_slice(pixel);
            }
        }

        let mut guard = lock.lock().unwrap();
        guard.caches.scent = scent;
        guard.caches.vision = vision;
        Ok(())
    }

    // ── Scent field ───────────────────────────────────────────────────────

    /// Advance the scent field for every patch in the active set — any
    /// fixed patch within `R + 1` cells of an active agent — and
    /// leave the rest untouched until they next become active (lazily
    /// caught up by [`World::get_fixed_patch`]'s callers via
    /// `scent::catch_up` the next time the patch is read with a stale
    /// `last_advanced_tick`).
    pub fn advance_scent_field(&mut self, active_positions: &[Position]) {
        let n = self.config.patch_size;
        let reach = self.config.vision_radius as i64 + 1;
        let mut active_coords = std::collections::HashSet::new();
        for pos in active_positions {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let cell = Position::new(pos.x + dx, pos.y + dy);
                    let (px, py) = cell.patch_coord(n);
                    active_coords.insert(PatchCoord::new(px, py));
                }
            }
        }

        self.clock = self.clock.next();
        for coord in active_coords {
            if !self.store.contains_fixed(coord) {
                continue;
            }
            self.advance_one_patch(coord);
        }
    }

    fn advance_one_patch(&mut self, coord: PatchCoord) {
        // Take the patch out of the store so the neighbor-scent lookup can
        // borrow the (now patch-less) store immutably while this patch is
        // advanced mutably — the two borrows never overlap.
        let mut patch = match self.store.get_if_fixed_mut(coord) {
            Some(p) => std::mem::replace(
                p,
                Patch::new_empty(coord, self.config.patch_size, self.config.scent_dims, self.config.color_dims, true),
            ),
            None => return,
        };

        {
            let lookup = StoreScentLookup { store: &self.store, patch_size: self.config.patch_size };
            scent::catch_up(
                &mut patch,
                &lookup,
                &self.config.items,
                self.config.scent_decay,
                self.config.scent_diffusion,
                self.config.deleted_item_lifetime,
                self.clock,
            );
        }
        patch.compact_removed_items(self.clock, self.config.deleted_item_lifetime);

        if let Some(slot) = self.store.get_if_fixed_mut(coord) {
            *slot = patch;
        }
    }
}
