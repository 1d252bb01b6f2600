//! Owner of the endpoint list and its scan sessions.
//!
//! [`RemoteBrowser`] is what a "select a controller" screen needs: a list
//! seeded from recently used controllers, one scan at a time, and a way to
//! hand a chosen controller on.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use wylight_types::Endpoint;

use crate::error::{Error, Result};
use crate::events::{ChangeReceiver, ScanSummary};
use crate::session::{DEFAULT_SCAN_TIMEOUT, ScanSession};
use crate::sink::EndpointList;
use crate::traits::CompletionListener;
use crate::transport::DiscoveryTransport;

/// Scans for controllers and keeps the list between scans.
#[derive(Debug)]
pub struct RemoteBrowser {
    transport: Arc<dyn DiscoveryTransport>,
    list: EndpointList,
    session: Option<ScanSession>,
    timeout: Duration,
}

impl RemoteBrowser {
    /// Create a browser with an empty list.
    pub fn new(transport: Arc<dyn DiscoveryTransport>) -> Self {
        Self {
            transport,
            list: EndpointList::new(),
            session: None,
            timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }

    /// Set the duration of each scan.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Seed the list with previously used controllers, in order.
    #[must_use]
    pub fn with_known(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        let added = self.list.load(endpoints);
        debug!("Loaded {} known endpoint(s)", added);
        self
    }

    /// The endpoint list.
    pub fn list(&self) -> &EndpointList {
        &self.list
    }

    /// Subscribe to list change notifications.
    pub fn subscribe(&self) -> ChangeReceiver {
        self.list.subscribe()
    }

    /// Configured scan duration.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a scan was begun and not yet finished or torn down.
    pub fn is_scanning(&self) -> bool {
        self.session.is_some()
    }

    /// Mark the list offline and start a new session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] until the previous scan has been
    /// finished or torn down; the list is left untouched in that case.
    pub fn begin_scan(&mut self) -> Result<()> {
        if let Some(session) = &self.session {
            return Err(Error::invalid_state("start", session.state()));
        }

        let mut session = ScanSession::new(Arc::clone(&self.transport));
        self.list.mark_all_offline();
        session.start(self.timeout)?;
        self.session = Some(session);
        Ok(())
    }

    /// Apply the running session's events to the list until it ends.
    ///
    /// Returns `None` if there is no session or it was cancelled.
    pub async fn finish_scan<L>(&mut self, listener: &mut L) -> Option<ScanSummary>
    where
        L: CompletionListener + ?Sized,
    {
        let session = self.session.as_mut()?;
        let summary = session.deliver(&mut self.list, listener).await;
        self.session = None;
        if let Some(summary) = &summary {
            info!(
                "{} of {} endpoint(s) online",
                self.list.online_count(),
                self.list.len()
            );
            debug!("Scan summary: {:?}", summary);
        }
        summary
    }

    /// Run a complete scan: mark offline, discover, notify `listener`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if a scan is already running.
    pub async fn scan<L>(&mut self, listener: &mut L) -> Result<Option<ScanSummary>>
    where
        L: CompletionListener + ?Sized,
    {
        self.begin_scan()?;
        Ok(self.finish_scan(listener).await)
    }

    /// Stop any running scan and release the network before returning.
    pub async fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel().await;
        }
    }

    /// Hand over the endpoint at `index`.
    ///
    /// The returned copy is independent of the list. Its score is one higher
    /// than before, as is the listed entry's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndpointNotFound`] if `index` is out of range.
    pub fn select(&mut self, index: usize) -> Result<Endpoint> {
        let entry = self
            .list
            .get_mut(index)
            .ok_or_else(|| Error::endpoint_not_found(format!("#{}", index)))?;
        entry.score = entry.score.saturating_add(1);
        info!("Selected {}", entry);
        Ok(entry.clone())
    }

    /// Hand over the endpoint with `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndpointNotFound`] if no entry has that address.
    pub fn select_address(&mut self, address: &SocketAddr) -> Result<Endpoint> {
        let index = self
            .list
            .position(address)
            .ok_or_else(|| Error::endpoint_not_found(address.to_string()))?;
        self.select(index)
    }
}
