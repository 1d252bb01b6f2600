//! Callback contracts between a scan session and its owner.
//!
//! Both traits are invoked on the owner's task, never from the discovery
//! worker, so implementations need no synchronisation.

use wylight_types::Endpoint;

use crate::events::ScanSummary;

/// Receives every endpoint a session reports.
pub trait ResultSink {
    /// Called once per distinct address within a session.
    fn on_endpoint_found(&mut self, endpoint: Endpoint);
}

/// Notified when a session ends.
///
/// Called exactly once per completed session, after the last
/// [`ResultSink::on_endpoint_found`]. Cancelled sessions never call it.
pub trait CompletionListener {
    /// The session has finished; any busy indicator may be released.
    fn on_scan_complete(&mut self, summary: &ScanSummary);
}

impl ResultSink for Vec<Endpoint> {
    fn on_endpoint_found(&mut self, endpoint: Endpoint) {
        self.push(endpoint);
    }
}

impl<F> CompletionListener for F
where
    F: FnMut(&ScanSummary),
{
    fn on_scan_complete(&mut self, summary: &ScanSummary) {
        self(summary);
    }
}
