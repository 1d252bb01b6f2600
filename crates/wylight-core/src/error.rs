//! Error types for wylight-core.
//!
//! Discovery is deliberately forgiving: network trouble during a scan never
//! surfaces as an error to the caller. What remains visible here is misuse
//! of a session and lookups that fail.
//!
//! | Error Type | Where it surfaces |
//! |------------|-------------------|
//! | [`Error::InvalidState`] | [`crate::ScanSession::start`] on a session that is not idle |
//! | [`Error::DiscoveryUnavailable`] | [`crate::DiscoveryTransport::open`]; a session turns it into an empty scan |
//! | [`Error::Io`] | items of an endpoint stream; a session logs and skips them |
//! | [`Error::EndpointNotFound`] | [`crate::RemoteBrowser::select`] |
//! | [`Error::InvalidConfig`] | constructing a transport from bad settings |

use thiserror::Error;

use crate::session::ScanState;

/// Errors that can occur while discovering WyLight controllers.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Operation not allowed in the current session state.
    #[error("Cannot {operation} a scan session that is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State the session was in.
        state: ScanState,
    },

    /// The network medium used for discovery cannot be opened.
    #[error("Discovery unavailable: {0}")]
    DiscoveryUnavailable(String),

    /// I/O error while receiving.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// No endpoint matches the requested index or address.
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an invalid state error.
    pub fn invalid_state(operation: &'static str, state: ScanState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create a discovery unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::DiscoveryUnavailable(reason.into())
    }

    /// Create an endpoint not found error.
    pub fn endpoint_not_found(what: impl Into<String>) -> Self {
        Self::EndpointNotFound(what.into())
    }
}

/// Result type alias using wylight-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
