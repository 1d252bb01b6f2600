//! Scan and list event types.
//!
//! A scan session produces [`ScanEvent`]s on a single channel; the endpoint
//! list publishes [`ListChange`] notifications to any number of observers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use wylight_types::Endpoint;

/// Events delivered by a scan session, in order.
///
/// Exactly one [`ScanEvent::Completed`] ends every session that was not
/// cancelled, and nothing follows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// An endpoint not reported before in this session.
    Found { endpoint: Endpoint },
    /// The session ended.
    Completed { summary: ScanSummary },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The deadline expired.
    Timeout,
    /// The discovery medium had nothing more to report.
    Exhausted,
    /// The discovery medium could not be opened.
    Unavailable,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Exhausted => write!(f, "discovery exhausted"),
            Self::Unavailable => write!(f, "discovery unavailable"),
        }
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of distinct endpoints reported.
    pub found: usize,
    /// Why the session ended.
    pub reason: CompletionReason,
    /// Time from start to completion.
    pub elapsed: Duration,
}

/// Change to an [`crate::EndpointList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListChange {
    /// Every entry's online flag was set.
    Reset { online: bool },
    /// Entries were loaded in bulk.
    Loaded { count: usize },
    /// The entry at `index` was updated in place.
    Updated { index: usize },
    /// A new entry was appended at `index`.
    Appended { index: usize },
}

/// Sender for list changes.
pub type ChangeSender = broadcast::Sender<ListChange>;

/// Receiver for list changes.
pub type ChangeReceiver = broadcast::Receiver<ListChange>;
