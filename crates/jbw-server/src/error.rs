use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("world/coordinator error: {0}")]
    Coordinator(#[from] jbw_coordinator::CoordinatorError),

    #[error("protocol error: {0}")]
    Proto(#[from] jbw_proto::ProtoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;
