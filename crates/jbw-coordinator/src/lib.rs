//! `jbw-coordinator` — the per-tick step state machine.
//!
//! | Module       | Contents                                    |
//! |--------------|-----------------------------------------------|
//! | [`conflict`] | Movement-conflict resolution   |
//! | [`coordinator`] | `StepCoordinator`, `CoordinatorPhase`     |
//! | [`observer`] | `StepObserver`, the in-process step callback |
//! | [`error`]    | `CoordinatorError`, `CoordinatorResult`      |

mod conflict;
pub mod coordinator;
pub mod error;
pub mod observer;

#[cfg(test)]
mod tests;

pub use coordinator::{CoordinatorPhase, StepCoordinator};
pub use error::{CoordinatorError, CoordinatorResult};
pub use observer::{NoopObserver, StepObserver};
