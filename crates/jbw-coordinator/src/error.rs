use jbw_core::{AgentId, JbwError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("world error: {0}")]
    World(#[from] JbwError),

    /// A caller tried to submit an action while the coordinator was inside
    /// `Resolving`/`Broadcasting`. Can't happen via [`crate::StepCoordinator`]
    /// itself — `Resolving` runs to completion without yielding — but a
    /// server dispatch layer racing a submission against a resolve on
    /// another thread should surface this rather than corrupt ordering.
    #[error("agent {agent} submitted outside AwaitingActions")]
    NotAwaitingActions { agent: AgentId },

    /// Allocation failure mid-`Resolving` is fatal to the tick: the
    /// clock does not advance and the world is left in its pre-resolve
    /// state. Rust's global allocator aborts the process on real OOM rather
    /// than returning an error, so this variant exists for the contract and
    /// for hosts that inject their own fallible allocation checks ahead of
    /// a resolve; [`crate::StepCoordinator::try_resolve`] never raises it.
    #[error("allocation failure during resolve; tick {tick} aborted")]
    ResolveAborted { tick: u64 },
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
