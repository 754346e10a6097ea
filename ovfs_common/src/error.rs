use thiserror::Error;

#[derive(Error, Debug)]
pub enum VfsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unsupported path: {0}")]
    UnsupportedPath(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Errors raised by an object store backend.
///
/// Absence of an object is not an error: `head` reports it as `Ok(None)` so
/// that callers can tell "not there" apart from "could not ask".
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid byte range for {0}")]
    InvalidRange(String),
}

impl From<StoreError> for VfsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => VfsError::NotFound(path),
            StoreError::Transport(msg) => VfsError::Transport(msg),
            StoreError::InvalidRange(path) => {
                VfsError::Transport(format!("invalid byte range for {}", path))
            }
        }
    }
}
