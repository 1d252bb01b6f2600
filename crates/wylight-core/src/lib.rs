//! Discovery of WyLight lighting controllers on the local network.
//!
//! WyLight controllers are built around a WiFly module that announces itself
//! with a UDP broadcast about once per second. This crate listens for those
//! announcements for a bounded time and turns them into a deduplicated,
//! ordered list of [`Endpoint`]s a user can pick from.
//!
//! # Features
//!
//! - **Scan sessions**: bounded discovery runs with cancellation
//! - **Endpoint list**: stable ordering across rescans with change notifications
//! - **Pluggable transports**: the UDP [`BroadcastReceiver`] or a [`MockTransport`]
//! - **Remote browser**: list plus session handling for a selection screen
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wylight_core::{BroadcastReceiver, RemoteBrowser, ScanSummary};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut browser = RemoteBrowser::new(Arc::new(BroadcastReceiver::default()));
//!     browser.scan(&mut |s: &ScanSummary| println!("{} found", s.found)).await?;
//!
//!     for endpoint in browser.list() {
//!         println!("{}", endpoint);
//!     }
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod error;
pub mod events;
pub mod mock;
pub mod receiver;
pub mod session;
pub mod sink;
pub mod traits;
pub mod transport;

// Core exports
pub use browser::RemoteBrowser;
pub use error::{Error, Result};
pub use receiver::BroadcastReceiver;
pub use session::{DEFAULT_SCAN_TIMEOUT, ScanSession, ScanState};
pub use sink::EndpointList;
pub use traits::{CompletionListener, ResultSink};
pub use transport::{DiscoveryTransport, EndpointStream};

pub use events::{ChangeReceiver, ChangeSender, CompletionReason, ListChange, ScanEvent, ScanSummary};
pub use mock::{MockTransport, MockTransportBuilder};

// Re-export from wylight-types
pub use wylight_types::{
    BROADCAST_MESSAGE_LEN, BroadcastMessage, DEFAULT_BROADCAST_PORT, Endpoint, ParseError,
};
