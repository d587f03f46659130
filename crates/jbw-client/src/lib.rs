//! Client for the Jelly Bean World wire protocol: a synchronous
//! call API backed by one socket and a background reader task that
//! demultiplexes responses by sequence number.

pub mod client;
pub mod error;

pub use client::{HandshakeInfo, JbwClient, StepCallback};
pub use error::{ClientError, ClientResult};

#[cfg(test)]
mod tests;
