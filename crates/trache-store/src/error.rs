use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The content document exists but is not a valid site document.
    /// Fatal to startup: serving defaults over a corrupt file would hide it.
    #[error("Malformed content document '{}': {source}", path.display())]
    MalformedDocument {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to encode the document.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing the message log failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic I/O error (reading, temp file, rename).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
