use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("bad magic bytes: expected \"JBW1\", found {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported snapshot version {found}; this build reads version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("snapshot protocol error: {0}")]
    Proto(#[from] jbw_proto::ProtoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
