//! Trait abstraction for the discovery medium.
//!
//! A scan session never touches sockets itself. The embedding host hands it
//! a [`DiscoveryTransport`]; the UDP [`crate::BroadcastReceiver`] is the real
//! one and [`crate::MockTransport`] drives tests.

use async_trait::async_trait;
use futures::stream::BoxStream;

use wylight_types::Endpoint;

use crate::error::Result;

/// Endpoints as they arrive from the medium.
///
/// Items may repeat; deduplication is the session's job. An `Err` item is a
/// transient receive failure. The stream ending means the medium is
/// exhausted. Dropping the stream must release every network resource the
/// transport holds.
pub type EndpointStream = BoxStream<'static, Result<Endpoint>>;

/// Trait abstracting the network medium used to find controllers.
///
/// # Example
///
/// ```ignore
/// use futures::StreamExt;
/// use wylight_core::{DiscoveryTransport, Result};
///
/// async fn first<T: DiscoveryTransport>(transport: &T) -> Result<()> {
///     let mut endpoints = transport.open().await?;
///     if let Some(Ok(endpoint)) = endpoints.next().await {
///         println!("{}", endpoint);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    /// Open the medium and start listening.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DiscoveryUnavailable`] when the medium cannot
    /// be used at all (no interface, port cannot be bound).
    async fn open(&self) -> Result<EndpointStream>;

    /// Short human readable description for logs.
    fn describe(&self) -> String {
        "discovery transport".to_string()
    }
}

impl std::fmt::Debug for dyn DiscoveryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
