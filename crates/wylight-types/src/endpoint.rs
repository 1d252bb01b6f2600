//! The endpoint model shared by discovery, the result list and the store.

use core::fmt;
use std::net::{IpAddr, SocketAddr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A WyLight controller reachable over the network.
///
/// The `address` is the identity of an endpoint: two values with the same
/// address describe the same controller, even if their names differ.
///
/// # Examples
///
/// ```
/// use wylight_types::Endpoint;
///
/// let endpoint = Endpoint::new("192.168.0.14:2000".parse().unwrap(), "WiFly-EZX");
/// assert_eq!(endpoint.port(), 2000);
/// assert!(!endpoint.online);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Endpoint {
    /// IP address of the controller and the TCP port it accepts commands on.
    pub address: SocketAddr,
    /// Display name (the WiFly device id), may be empty.
    pub name: String,
    /// Whether the controller answered during the current scan.
    #[cfg_attr(feature = "serde", serde(default))]
    pub online: bool,
    /// How often this controller has been selected.
    #[cfg_attr(feature = "serde", serde(default))]
    pub score: u32,
    /// When the controller was last confirmed on the network.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "time::serde::rfc3339::option")
    )]
    pub last_seen: Option<OffsetDateTime>,
}

impl Endpoint {
    /// Create an offline endpoint with a zero score.
    pub fn new(address: SocketAddr, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            online: false,
            score: 0,
            last_seen: None,
        }
    }

    /// Create an endpoint that was just seen on the network.
    pub fn discovered(address: SocketAddr, name: impl Into<String>) -> Self {
        Self {
            online: true,
            last_seen: Some(OffsetDateTime::now_utc()),
            ..Self::new(address, name)
        }
    }

    /// Set the usage score.
    #[must_use]
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    /// IP address of the controller.
    pub fn ip(&self) -> IpAddr {
        self.address.ip()
    }

    /// TCP control port of the controller.
    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Name to show to a user; falls back to the address for unnamed endpoints.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.address.to_string()
        } else {
            self.name.clone()
        }
    }

    /// Fold a fresh sighting of the same controller into this entry.
    ///
    /// Online state and timestamp always follow `other`; the name is only
    /// replaced by a non-empty one. The score is kept, it belongs to the
    /// long-lived entry.
    pub fn merge(&mut self, other: &Endpoint) {
        debug_assert_eq!(self.address, other.address);
        self.online = other.online;
        if !other.name.is_empty() {
            self.name.clone_from(&other.name);
        }
        if other.last_seen.is_some() {
            self.last_seen = other.last_seen;
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.name, self.address)
        }
    }
}
