//! Narrows a resolved tick's agent states down to each session's own
//! agents and queues them for the broadcaster.

use jbw_agent::AgentState;
use jbw_core::{AgentId, Tick};
use jbw_coordinator::StepObserver;

use crate::session::SessionTable;

pub struct BroadcastObserver<'a> {
    pub sessions: &'a SessionTable,
}

impl<'a> StepObserver for BroadcastObserver<'a> {
    fn on_step(&mut self, tick: Tick, agent_states: &[(AgentId, AgentState)]) {
        for session in self.sessions.all() {
            let owned = session.owned_agent_ids.lock().unwrap();
            if owned.is_empty() {
                continue;
            }
            let mine: Vec<(AgentId, AgentState)> =
                agent_states.iter().filter(|(id, _)| owned.contains(id)).cloned().collect();
            drop(owned);
            if !mine.is_empty() {
                session.set_pending_step(tick, mine);
            }
        }
        self.sessions.step_notify.notify_waiters();
    }

    fn on_resolve_aborted(&mut self, tick: Tick) {
        tracing::error!(tick = tick.0, "resolve aborted, tick did not advance");
    }
}
