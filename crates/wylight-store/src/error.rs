//! Error types for wylight-store.

use std::path::PathBuf;

/// Result type for wylight-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wylight-store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A line of the recent file could not be read as an endpoint.
    ///
    /// Reading skips such lines; this error is only logged.
    #[error("Corrupt entry on line {line}: {reason}")]
    CorruptPersistedEntry { line: u64, reason: String },

    /// Failed to create the directory holding the recent file.
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to encode or decode a record.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a corrupt entry error.
    pub fn corrupt(line: u64, reason: impl Into<String>) -> Self {
        Self::CorruptPersistedEntry {
            line,
            reason: reason.into(),
        }
    }
}
