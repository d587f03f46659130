//! `jbw-snapshot` — fixed-width streaming read/write of the entire world
//! state.
//!
//! | Module    | Contents                                           |
//! |-----------|-------------------------------------------------------|
//! | [`codec`] | `write`, `write_with_sessions`, `read`, `refresh_all_caches` |
//! | [`error`] | `SnapshotError`, `SnapshotResult`                   |

pub mod codec;
pub mod error;

#[cfg(test)]
mod tests;

pub use codec::{read, refresh_all_caches, write, write_with_sessions};
pub use error::{SnapshotError, SnapshotResult};
