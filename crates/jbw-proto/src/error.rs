//! Errors raised while encoding/decoding wire frames.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("frame truncated: wanted {wanted} bytes, had {had}")]
    Truncated { wanted: usize, had: usize },

    #[error("unknown request tag {0:#04x}")]
    UnknownRequestTag(u8),

    #[error("unknown response tag {0:#04x}")]
    UnknownResponseTag(u8),

    #[error("invalid direction byte {0}")]
    InvalidDirection(u8),

    #[error("invalid turn byte {0}")]
    InvalidTurn(u8),

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("invalid movement-conflict-policy byte {0}")]
    InvalidConflictPolicy(u8),

    #[error("invalid action-policy byte {0}")]
    InvalidActionPolicy(u8),

    #[error("string payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("frame body exceeds the configured maximum of {max} bytes (was {actual})")]
    FrameTooLarge { max: u32, actual: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtoResult<T> = Result<T, ProtoError>;
