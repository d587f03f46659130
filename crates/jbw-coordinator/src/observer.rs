//! The in-process step callback.

use jbw_agent::AgentState;
use jbw_core::{AgentId, Tick};

/// Invoked by [`crate::StepCoordinator::try_resolve`] once a tick's
/// `Resolving` phase completes (the `Resolving -> Broadcasting` edge).
///
/// Default methods are no-ops so implementors only override what they need.
/// Express as a trait object (`Box<dyn StepObserver>`) when the callback
/// needs to change at runtime, or a concrete type otherwise — no function
/// pointer plus opaque user-data pair is needed in Rust.
pub trait StepObserver {
    /// `agent_states` carries every *owned* agent's state as of immediately
    /// after `Resolving` — the server narrows this to a
    /// session's own agents before broadcasting.
    fn on_step(&mut self, _tick: Tick, _agent_states: &[(AgentId, AgentState)]) {}

    /// Called when a pending action request fails `AllocationFailure`-fatal
    /// resolve and the tick does not advance.
    fn on_resolve_aborted(&mut self, _tick: Tick) {}
}

/// A [`StepObserver`] that does nothing.
pub struct NoopObserver;

impl StepObserver for NoopObserver {}
