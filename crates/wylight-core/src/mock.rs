//! Mock discovery transport for testing.
//!
//! [`MockTransport`] replays a scripted list of sightings without touching
//! the network. It implements [`DiscoveryTransport`], so it can be injected
//! anywhere the UDP receiver is used.
//!
//! # Features
//!
//! - **Scripted sightings**: endpoints appear after configurable delays
//! - **Failure injection**: transient receive errors or an unusable medium
//! - **Open-ended mode**: keep the medium open after the script so only the
//!   session deadline ends the scan
//! - **Resource tracking**: count opens and releases of the medium

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use wylight_types::Endpoint;

use crate::error::{Error, Result};
use crate::transport::{DiscoveryTransport, EndpointStream};

#[derive(Debug, Clone)]
enum Sighting {
    Endpoint(Endpoint),
    Error(String),
}

/// A scripted discovery medium.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wylight_core::{MockTransport, ScanSession, ScanSummary};
///
/// #[tokio::main]
/// async fn main() {
///     let transport = MockTransport::builder()
///         .endpoint("192.168.0.14:2000", "WiFly-EZX")
///         .build();
///     let mut session = ScanSession::new(std::sync::Arc::new(transport));
///     let mut found = Vec::new();
///     session
///         .run(Duration::from_secs(3), &mut found, &mut |_: &ScanSummary| {})
///         .await
///         .unwrap();
///     assert_eq!(found.len(), 1);
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    script: Vec<(Duration, Sighting)>,
    unavailable: Option<String>,
    keep_open: bool,
    opened: AtomicU32,
    released: Arc<AtomicU32>,
}

/// Increments the release counter when the endpoint stream is dropped.
#[derive(Debug)]
struct ReleaseGuard(Arc<AtomicU32>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl MockTransport {
    /// Create a builder.
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder::new()
    }

    /// A medium that finds nothing and ends immediately.
    pub fn empty() -> Self {
        MockTransportBuilder::new().build()
    }

    /// How often the medium has been opened.
    pub fn open_count(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    /// How often an opened medium has been released again.
    pub fn release_count(&self) -> u32 {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether every opened medium has been released.
    pub fn is_released(&self) -> bool {
        self.open_count() == self.release_count()
    }
}

#[async_trait]
impl DiscoveryTransport for MockTransport {
    async fn open(&self) -> Result<EndpointStream> {
        if let Some(reason) = &self.unavailable {
            return Err(Error::unavailable(reason.clone()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        let guard = ReleaseGuard(Arc::clone(&self.released));

        let scripted = futures::stream::iter(self.script.clone()).then(|(delay, sighting)| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match sighting {
                Sighting::Endpoint(endpoint) => Ok(endpoint),
                Sighting::Error(msg) => Err(Error::Io(std::io::Error::other(msg))),
            }
        });

        let stream = if self.keep_open {
            scripted.chain(futures::stream::pending()).boxed()
        } else {
            scripted.boxed()
        };

        Ok(stream
            .map(move |item| {
                let _held = &guard;
                item
            })
            .boxed())
    }

    fn describe(&self) -> String {
        format!("mock transport ({} scripted sightings)", self.script.len())
    }
}

/// Builder for [`MockTransport`].
#[derive(Debug, Default)]
pub struct MockTransportBuilder {
    script: Vec<(Duration, Sighting)>,
    unavailable: Option<String>,
    keep_open: bool,
}

impl MockTransportBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an endpoint without delay.
    ///
    /// # Panics
    ///
    /// Panics if `address` is not a valid socket address.
    #[must_use]
    pub fn endpoint(self, address: &str, name: &str) -> Self {
        self.endpoint_after(Duration::ZERO, address, name)
    }

    /// Report an endpoint `delay` after the previous sighting.
    ///
    /// # Panics
    ///
    /// Panics if `address` is not a valid socket address.
    #[must_use]
    pub fn endpoint_after(self, delay: Duration, address: &str, name: &str) -> Self {
        let address: SocketAddr = address.parse().expect("valid socket address");
        self.sighting(delay, Endpoint::discovered(address, name))
    }

    /// Report a prepared endpoint `delay` after the previous sighting.
    #[must_use]
    pub fn sighting(mut self, delay: Duration, endpoint: Endpoint) -> Self {
        self.script.push((delay, Sighting::Endpoint(endpoint)));
        self
    }

    /// Produce a transient receive error `delay` after the previous sighting.
    #[must_use]
    pub fn error_after(mut self, delay: Duration, message: &str) -> Self {
        self.script.push((delay, Sighting::Error(message.to_string())));
        self
    }

    /// Make [`DiscoveryTransport::open`] fail.
    #[must_use]
    pub fn unavailable(mut self, reason: &str) -> Self {
        self.unavailable = Some(reason.to_string());
        self
    }

    /// Keep the medium open once the script has played.
    #[must_use]
    pub fn keep_open(mut self, keep_open: bool) -> Self {
        self.keep_open = keep_open;
        self
    }

    /// Build the transport.
    #[must_use]
    pub fn build(self) -> MockTransport {
        MockTransport {
            script: self.script,
            unavailable: self.unavailable,
            keep_open: self.keep_open,
            opened: AtomicU32::new(0),
            released: Arc::new(AtomicU32::new(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_is_replayed_in_order() {
        let transport = MockTransport::builder()
            .endpoint("10.0.0.1:2000", "A")
            .error_after(Duration::ZERO, "boom")
            .endpoint("10.0.0.2:2000", "B")
            .build();

        let items: Vec<_> = transport.open().await.unwrap().collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().name, "A");
        assert!(items[1].is_err());
        assert_eq!(items[2].as_ref().unwrap().name, "B");
    }

    #[tokio::test]
    async fn test_release_tracking() {
        let transport = MockTransport::builder().keep_open(true).build();
        let stream = transport.open().await.unwrap();
        assert_eq!(transport.open_count(), 1);
        assert!(!transport.is_released());

        drop(stream);
        assert!(transport.is_released());
    }

    #[tokio::test]
    async fn test_unavailable_does_not_count_as_open() {
        let transport = MockTransport::builder().unavailable("wifi disabled").build();
        let err = transport.open().await.err().unwrap();
        assert!(matches!(err, Error::DiscoveryUnavailable(_)));
        assert_eq!(transport.open_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_are_applied() {
        let transport = MockTransport::builder()
            .endpoint_after(Duration::from_secs(2), "10.0.0.1:2000", "A")
            .build();
        let start = tokio::time::Instant::now();
        let mut stream = transport.open().await.unwrap();
        stream.next().await.unwrap().unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
