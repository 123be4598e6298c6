use std::io;
use thiserror::Error;

/// Failure talking to the remote snippet service.
///
/// Every variant is recovered the same way by the save policy and the sync
/// reconciler; the split only exists so messages stay readable.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote service unreachable: {0}")]
    Transport(String),

    #[error("remote response was not valid JSON: {0}")]
    Decode(String),

    #[error("remote service returned a snippet without an id")]
    MissingId,
}

impl RemoteError {
    /// HTTP status of the failed response, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reading or writing the persisted snippet sequence.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SnipError {
    #[error("Invalid snippet: {0}")]
    Validation(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Local store error: {0}")]
    LocalStore(#[from] LocalStoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No snippet at position {0}")]
    NotFound(usize),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, SnipError>;
