//! On-disk record of the recent file.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use wylight_types::Endpoint;

/// One line of the recent file: `address,name,score,last_seen`.
///
/// Score and timestamp may be missing; files written before they existed
/// hold only address and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EndpointRecord {
    pub address: SocketAddr,
    pub name: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_seen: Option<OffsetDateTime>,
}

impl From<&Endpoint> for EndpointRecord {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            address: endpoint.address,
            name: endpoint.name.clone(),
            score: endpoint.score,
            last_seen: endpoint.last_seen,
        }
    }
}

impl From<EndpointRecord> for Endpoint {
    fn from(record: EndpointRecord) -> Self {
        let mut endpoint = Endpoint::new(record.address, record.name).with_score(record.score);
        endpoint.last_seen = record.last_seen;
        endpoint
    }
}
