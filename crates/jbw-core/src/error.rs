//! Wire-level status taxonomy and the richer in-process error type.
//!
//! `Status` is the `u16` carried on the wire; `JbwError` is what
//! library code actually returns, carrying enough context to log or to
//! answer a caller, and collapses to a `Status` only at the RPC boundary.

use thiserror::Error;

use crate::{AgentId, ClientId};

/// Wire-level status code. Mirrors the taxonomy exactly — one variant per
/// code, no fallthrough between cases.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum Status {
    Ok = 0,
    OutOfMemory = 1,
    InvalidAgentId = 2,
    PermissionError = 3,
    AgentAlreadyActed = 4,
    AgentAlreadyExists = 5,
    ServerParseError = 6,
    ClientParseError = 7,
    ServerOom = 8,
    ClientOom = 9,
    InvalidConfiguration = 10,
    IoError = 11,
    LostConnection = 12,
    MpiError = 13,
}

impl Status {
    pub fn to_wire(self) -> u16 {
        self as u16
    }

    /// Inverse of `to_wire`. Returns `None` for any tag outside the
    /// taxonomy rather than silently mapping to a default.
    pub fn from_wire(tag: u16) -> Option<Status> {
        use Status::*;
        let s = match tag {
            0 => Ok,
            1 => OutOfMemory,
            2 => InvalidAgentId,
            3 => PermissionError,
            4 => AgentAlreadyActed,
            5 => AgentAlreadyExists,
            6 => ServerParseError,
            7 => ClientParseError,
            8 => ServerOom,
            9 => ClientOom,
            10 => InvalidConfiguration,
            11 => IoError,
            12 => LostConnection,
            13 => MpiError,
            _ => return None,
        };
        Some(s)
    }
}

impl From<&JbwError> for Status {
    /// Strict one-to-one mapping, deliberately not a fallthrough `match`
    /// with omitted arms — every variant names its own code.
    fn from(err: &JbwError) -> Status {
        match err {
            JbwError::OutOfMemory => Status::OutOfMemory,
            JbwError::InvalidAgentId(_) => Status::InvalidAgentId,
            JbwError::PermissionError { .. } => Status::PermissionError,
            JbwError::ActionDisallowed { .. } => Status::PermissionError,
            JbwError::AgentAlreadyActed(_) => Status::AgentAlreadyActed,
            JbwError::AgentAlreadyExists(_) => Status::AgentAlreadyExists,
            JbwError::ServerParseError(_) => Status::ServerParseError,
            JbwError::ClientParseError(_) => Status::ClientParseError,
            JbwError::ServerOom => Status::ServerOom,
            JbwError::ClientOom => Status::ClientOom,
            JbwError::InvalidConfiguration(_) => Status::InvalidConfiguration,
            JbwError::Io(_) => Status::IoError,
            JbwError::LostConnection(_) => Status::LostConnection,
            JbwError::Mpi(_) => Status::MpiError,
        }
    }
}

/// The error type returned by `jbw-core` and the crates built on it.
#[derive(Debug, Error)]
pub enum JbwError {
    #[error("out of memory")]
    OutOfMemory,

    #[error("agent {0} not found")]
    InvalidAgentId(AgentId),

    #[error("client {client} lacks permission for {action}")]
    PermissionError { client: ClientId, action: &'static str },

    /// An action was rejected by a `Disallowed` `ActionPolicy`. There
    /// is no dedicated wire code for this — it shares `PermissionError`'s,
    /// since both describe a policy denying an otherwise well-formed
    /// request, but the two are kept as distinct variants here so logs and
    /// callers can tell a client-permission denial from a world-policy one.
    #[error("agent {agent} action denied by policy: {action}")]
    ActionDisallowed { agent: AgentId, action: &'static str },

    #[error("agent {0} already acted this tick")]
    AgentAlreadyActed(AgentId),

    #[error("agent {0} already exists")]
    AgentAlreadyExists(AgentId),

    #[error("server failed to parse request: {0}")]
    ServerParseError(String),

    #[error("client failed to parse response: {0}")]
    ClientParseError(String),

    #[error("server ran out of memory")]
    ServerOom,

    #[error("client ran out of memory")]
    ClientOom,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection to client {0} was lost")]
    LostConnection(ClientId),

    #[error("distributed-coordination error: {0}")]
    Mpi(String),
}

/// Shorthand result type for all `jbw-*` crates.
pub type JbwResult<T> = Result<T, JbwError>;
