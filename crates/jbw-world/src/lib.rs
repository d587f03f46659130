//! `jbw-world` — the infinite grid: patch storage, item placement, scent
//! diffusion, and the `World` API the coordinator and server drive.
//!
//! | Module     | Contents                                          |
//! |------------|-----------------------------------------------------|
//! | [`patch`]  | `Patch`, `PatchItem`, `RemovedItem`                |
//! | [`gibbs`]  | Markov-chain item placement (`materialize_fixed`, `sample_provisional`) |
//! | [`scent`]  | Scent diffusion/decay/afterglow (`catch_up`)       |
//! | [`store`]  | `PatchStore`, lazily materializing fixed patches   |
//! | [`world`]  | `World`, the API the coordinator and server use    |

pub mod gibbs;
pub mod patch;
pub mod scent;
pub mod store;
pub mod world;

#[cfg(test)]
mod tests;

pub use patch::{Patch, PatchItem, RemovedItem};
pub use scent::ScentLookup;
pub use store::PatchStore;
pub use world::{PatchView, World};
