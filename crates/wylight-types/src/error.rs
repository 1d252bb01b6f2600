//! Error types for data parsing in wylight-types.

use thiserror::Error;

/// Errors that can occur when decoding WyLight wire data.
///
/// This error type is platform-agnostic and does not include
/// socket errors (those belong in wylight-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The datagram does not have the size of a WiFly broadcast.
    #[error("Invalid length: requires {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required number of bytes.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },

    /// The datagram has the right size but was not sent by a WiFly module.
    #[error("Not a WiFly broadcast (device id {0:?})")]
    NotWifly(String),
}

/// Result type alias using wylight-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
