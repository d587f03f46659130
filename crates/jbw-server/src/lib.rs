//! Asynchronous TCP server for the Jelly Bean World protocol:
//! connection handshake and reconnect, permission/ownership-gated
//! request dispatch, and the per-tick STEP broadcaster.

pub mod dispatch;
pub mod error;
pub mod observer;
pub mod server;
pub mod session;

pub use dispatch::SimCore;
pub use error::{ServerError, ServerResult};
pub use observer::BroadcastObserver;
pub use server::{stop_server, JbwServer};
pub use session::{Session, SessionStatus, SessionTable};

#[cfg(test)]
mod tests;
