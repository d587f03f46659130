//! Owns every agent record and hands out monotonically increasing ids.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use jbw_core::{AgentId, Direction, JbwError, JbwResult, Position};

use crate::record::{AgentLock, AgentRecord};

/// Registry of all agents known to the simulator, live or otherwise.
///
/// Agent ids are never reused, so `next_agent_id` only ever
/// increases, even across `remove_agent` calls.
pub struct AgentRegistry {
    agents: FxHashMap<AgentId, Arc<AgentLock>>,
    next_agent_id: u64,
    item_type_count: usize,
}

impl AgentRegistry {
    pub fn new(item_type_count: usize) -> Self {
        AgentRegistry {
            agents: FxHashMap::default(),
            next_agent_id: 0,
            item_type_count,
        }
    }

    /// Allocate a fresh `AgentId` and insert a new record at `position`
    /// facing `facing`. Always succeeds — collision/placement validity is
    /// the world's concern, not the registry's.
    pub fn add_agent(&mut self, position: Position, facing: Direction) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        let record = AgentRecord::new(position, facing, self.item_type_count);
        self.agents.insert(id, Arc::new(Mutex::new(record)));
        id
    }

    /// Drop the agent's record entirely. The id is never reissued.
    pub fn remove_agent(&mut self, id: AgentId) -> JbwResult<()> {
        self.agents.remove(&id).map(|_| ()).ok_or(JbwError::InvalidAgentId(id))
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Clone of the `Arc` guarding one agent's record, for callers that
    /// need to hold the lock across other work (e.g. the coordinator
    /// during `Resolving`).
    pub fn lock_handle(&self, id: AgentId) -> JbwResult<Arc<AgentLock>> {
        self.agents.get(&id).cloned().ok_or(JbwError::InvalidAgentId(id))
    }

    pub fn is_active(&self, id: AgentId) -> JbwResult<bool> {
        let lock = self.lock_handle(id)?;
        let guard = lock.lock().unwrap();
        Ok(guard.active)
    }

    /// `set_active` is idempotent: setting the same value
    /// twice has the same observable effect as setting it once.
    pub fn set_active(&self, id: AgentId, active: bool) -> JbwResult<()> {
        let lock = self.lock_handle(id)?;
        let mut guard = lock.lock().unwrap();
        guard.active = active;
        Ok(())
    }

    /// All ids of agents currently flagged active, i.e. in the
    /// required-set for the next tick.
    pub fn active_agent_ids(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|(_, lock)| lock.lock().unwrap().active)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn next_agent_id(&self) -> u64 {
        self.next_agent_id
    }

    /// Reconstruct a registry from snapshot data, preserving the next-id
    /// counter exactly (agent ids must never be reused across a
    /// save/restore boundary).
    pub fn from_parts(
        item_type_count: usize,
        next_agent_id: u64,
        agents: FxHashMap<AgentId, AgentRecord>,
    ) -> Self {
        AgentRegistry {
            agents: agents.into_iter().map(|(id, rec)| (id, Arc::new(Mutex::new(rec)))).collect(),
            next_agent_id,
            item_type_count,
        }
    }

    /// Snapshot every agent's record by value. Takes each per-agent lock
    /// in turn; callers must not hold a conflicting lock when calling
    /// this (used only during snapshot I/O, which already holds the
    /// world writer lock).
    pub fn snapshot_records(&self) -> Vec<(AgentId, AgentRecord)> {
        let mut ids: Vec<AgentId> = self.agents.keys().copied().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| {
                let lock = &self.agents[&id];
                (id, lock.lock().unwrap().clone())
            })
            .collect()
    }
}
