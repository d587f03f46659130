//! `jbw-core` — foundational types for the Jelly Bean World simulator.
//!
//! This crate is a dependency of every other `jbw-*` crate. It
//! intentionally has no `jbw-*` dependencies and minimal external ones
//! (only `rand` and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `AgentId`, `ClientId`, `ItemTypeId`, `PatchCoord`          |
//! | [`position`]| `Position`, `Direction`, `TurnDirection`                   |
//! | [`policy`]  | `ActionPolicy`, `MovementConflictPolicy`                    |
//! | [`item`]    | `ItemType`, `IntensityFn`, `InteractionFn`, `Registry`     |
//! | [`time`]    | `Tick`                                                      |
//! | [`rng`]     | `GibbsRng` (per-cell), `TickRng` (per-tick)                |
//! | [`config`]  | `WorldConfig`, `SimulatorConfig`                           |
//! | [`error`]   | `Status`, `JbwError`, `JbwResult`                          |
//! | [`session`] | `Permissions`, `SessionRecord`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. Required to load a config file and by `jbw-snapshot`. |

pub mod config;
pub mod error;
pub mod ids;
pub mod item;
pub mod policy;
pub mod position;
pub mod rng;
pub mod session;
pub mod time;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DirectionPolicies, SimulatorConfig, TurnPolicies, WorldConfig};
pub use error::{JbwError, JbwResult, Status};
pub use ids::{AgentId, ClientId, ItemTypeId, PatchCoord};
pub use item::{IntensityFn, InteractionFn, ItemType, Registry};
pub use policy::{ActionPolicy, MovementConflictPolicy};
pub use position::{Direction, Position, TurnDirection};
pub use rng::{GibbsRng, TickRng};
pub use session::{Permissions, SessionRecord};
pub use time::Tick;
