//! Errors a call on [`crate::JbwClient`] can fail with.

use jbw_core::Status;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The socket closed, or the reader task exited, while this call was
    /// pending.
    #[error("connection lost")]
    LostConnection,

    #[error(transparent)]
    Proto(#[from] jbw_proto::ProtoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server answered with a different response variant than the
    /// one this request's tag implies — a protocol-level inconsistency,
    /// not a request failure the server reported deliberately.
    #[error("server returned a response variant that doesn't match the request")]
    UnexpectedResponse,

    /// The server completed the request but reported a non-`Ok` status
    ///. The world was not mutated by a request that ends up here.
    #[error("request failed: {0:?}")]
    Remote(Status),
}

pub type ClientResult<T> = Result<T, ClientError>;
