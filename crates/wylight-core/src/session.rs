//! Bounded discovery runs.
//!
//! A [`ScanSession`] listens on an injected [`DiscoveryTransport`] for a
//! fixed time and reports each controller once. The network work happens on
//! a spawned task; events are pulled by the session's owner, so result
//! handling always runs on the owner's task.
//!
//! ```text
//! Idle ──start──▶ Running ──deadline / medium exhausted──▶ Completed
//!                    │
//!                    └──────────────cancel──────────────▶ Cancelled
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wylight_core::{BroadcastReceiver, EndpointList, ScanSession, ScanSummary};
//!
//! #[tokio::main]
//! async fn main() -> wylight_core::Result<()> {
//!     let mut list = EndpointList::new();
//!     let mut session = ScanSession::new(Arc::new(BroadcastReceiver::default()));
//!     session
//!         .run(wylight_core::DEFAULT_SCAN_TIMEOUT, &mut list, &mut |s: &ScanSummary| {
//!             println!("{} controller(s) found", s.found);
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wylight_types::Endpoint;

use crate::error::{Error, Result};
use crate::events::{CompletionReason, ScanEvent, ScanSummary};
use crate::traits::{CompletionListener, ResultSink};
use crate::transport::DiscoveryTransport;

/// Default scan duration.
///
/// WiFly modules broadcast roughly once per second, so three seconds catch
/// every module in range at least twice.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(3);

/// Capacity of the event channel between worker and owner.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Pause after a failed receive before polling the medium again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Lifecycle state of a [`ScanSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Created, not started.
    Idle,
    /// Discovery in progress, or its completion not yet delivered.
    Running,
    /// Ended by deadline or exhaustion; the completion was delivered.
    Completed,
    /// Stopped by the owner; nothing more is delivered.
    Cancelled,
}

impl ScanState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Move `state` from `Running` to `to`; false if it was not running.
fn leave_running(state: &watch::Sender<ScanState>, to: ScanState) -> bool {
    state.send_if_modified(|current| {
        if *current == ScanState::Running {
            *current = to;
            true
        } else {
            false
        }
    })
}

/// One bounded discovery run.
///
/// A session is single-use: once completed or cancelled it stays that way.
/// Create a new session for every scan.
pub struct ScanSession {
    transport: Arc<dyn DiscoveryTransport>,
    state: Arc<watch::Sender<ScanState>>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    events: Option<mpsc::Receiver<ScanEvent>>,
    started_at: Option<Instant>,
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("transport", &self.transport.describe())
            .field("state", &self.state())
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl ScanSession {
    /// Create an idle session on `transport`.
    pub fn new(transport: Arc<dyn DiscoveryTransport>) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            transport,
            state: Arc::new(state),
            cancel: CancellationToken::new(),
            worker: None,
            events: None,
            started_at: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// When the session was started.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Start discovery with a hard deadline of `timeout` from now.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the session is not idle. Nothing is
    /// spawned and no event is produced in that case.
    pub fn start(&mut self, timeout: Duration) -> Result<()> {
        let state = self.state();
        if state != ScanState::Idle {
            return Err(Error::invalid_state("start", state));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let started_at = Instant::now();
        self.state.send_replace(ScanState::Running);
        self.started_at = Some(started_at);
        self.events = Some(rx);

        let worker = Worker {
            transport: Arc::clone(&self.transport),
            deadline: started_at + timeout,
            started_at,
            events: tx,
            cancel: self.cancel.clone(),
        };
        info!(
            "Starting scan for {:?} using {}",
            timeout,
            self.transport.describe()
        );
        self.worker = Some(tokio::spawn(worker.run()));
        Ok(())
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the session has delivered its completion, was
    /// cancelled, or was never started.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        if self.state() == ScanState::Cancelled {
            return None;
        }
        let event = self.events.as_mut()?.recv().await;

        match event {
            Some(ScanEvent::Completed { .. }) => {
                self.events = None;
                self.reap_worker().await;
                leave_running(&self.state, ScanState::Completed);
            }
            None => {
                self.events = None;
                self.reap_worker().await;
                if leave_running(&self.state, ScanState::Cancelled) {
                    warn!("Scan worker stopped without completing");
                }
            }
            Some(ScanEvent::Found { .. }) => {}
        }
        event
    }

    /// Deliver events to `sink` and `listener` until the session ends.
    ///
    /// Returns the summary, or `None` if the session was cancelled.
    pub async fn deliver<S, L>(&mut self, sink: &mut S, listener: &mut L) -> Option<ScanSummary>
    where
        S: ResultSink + ?Sized,
        L: CompletionListener + ?Sized,
    {
        while let Some(event) = self.next_event().await {
            match event {
                ScanEvent::Found { endpoint } => sink.on_endpoint_found(endpoint),
                ScanEvent::Completed { summary } => {
                    listener.on_scan_complete(&summary);
                    return Some(summary);
                }
            }
        }
        None
    }

    /// Start the session and deliver all of its events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the session is not idle.
    pub async fn run<S, L>(
        &mut self,
        timeout: Duration,
        sink: &mut S,
        listener: &mut L,
    ) -> Result<Option<ScanSummary>>
    where
        S: ResultSink + ?Sized,
        L: CompletionListener + ?Sized,
    {
        self.start(timeout)?;
        Ok(self.deliver(sink, listener).await)
    }

    /// Stop a running session.
    ///
    /// Returns after the worker has exited and released the transport.
    /// Events still queued are discarded, including a completion the owner
    /// has not received yet. A no-op for sessions that are idle or already
    /// finished.
    pub async fn cancel(&mut self) {
        let was_running = leave_running(&self.state, ScanState::Cancelled);
        self.cancel.cancel();
        if let Some(events) = self.events.as_mut() {
            events.close();
        }
        self.reap_worker().await;
        self.events = None;
        if was_running {
            info!("Scan cancelled");
        }
    }

    async fn reap_worker(&mut self) {
        if let Some(worker) = self.worker.take()
            && let Err(e) = worker.await
        {
            warn!("Scan worker ended abnormally: {}", e);
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        leave_running(&self.state, ScanState::Cancelled);
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// The background half of a session.
struct Worker {
    transport: Arc<dyn DiscoveryTransport>,
    deadline: Instant,
    started_at: Instant,
    events: mpsc::Sender<ScanEvent>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        let mut found = 0;
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            reason = self.discover(&mut found) => reason,
        };

        let Some(reason) = outcome else {
            debug!("Scan stopped after {:?}", self.started_at.elapsed());
            return;
        };

        let summary = ScanSummary {
            found,
            reason,
            elapsed: self.started_at.elapsed(),
        };
        info!("Scan complete ({}). Found {} endpoint(s)", reason, found);
        // The owner may already be gone; there is nobody left to tell.
        // The state moves to Completed once the owner receives this.
        let _ = self.events.send(ScanEvent::Completed { summary }).await;
    }

    /// Report endpoints until the deadline passes or the medium runs dry.
    ///
    /// The endpoint stream, and with it the network handle, is dropped
    /// before this returns. `None` means the owner stopped listening.
    async fn discover(&self, found: &mut usize) -> Option<CompletionReason> {
        let mut stream = match timeout_at(self.deadline, self.transport.open()).await {
            Err(_) => return Some(CompletionReason::Timeout),
            Ok(Err(e)) => {
                warn!("{}", e);
                return Some(CompletionReason::Unavailable);
            }
            Ok(Ok(stream)) => stream,
        };

        let mut seen = HashSet::new();
        loop {
            let endpoint = match timeout_at(self.deadline, stream.next()).await {
                Err(_) => return Some(CompletionReason::Timeout),
                Ok(None) => return Some(CompletionReason::Exhausted),
                Ok(Some(Err(e))) => {
                    debug!("Ignoring discovery error: {}", e);
                    if timeout_at(self.deadline, sleep(RECEIVE_ERROR_BACKOFF))
                        .await
                        .is_err()
                    {
                        return Some(CompletionReason::Timeout);
                    }
                    continue;
                }
                Ok(Some(Ok(endpoint))) => endpoint,
            };

            if !seen.insert(endpoint.address) {
                continue;
            }
            debug!("Found {}", endpoint);
            match timeout_at(self.deadline, self.report(endpoint)).await {
                Err(_) => return Some(CompletionReason::Timeout),
                Ok(false) => return None,
                Ok(true) => *found += 1,
            }
        }
    }

    async fn report(&self, endpoint: Endpoint) -> bool {
        self.events
            .send(ScanEvent::Found { endpoint })
            .await
            .is_ok()
    }
}
