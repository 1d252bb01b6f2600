//! The ordered endpoint list shown to a user.
//!
//! Entries are unique by address and keep the position at which they were
//! first seen. A new scan does not clear the list; it marks every entry
//! offline and lets the scan bring confirmed controllers back online.

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::sync::broadcast;
use tracing::debug;

use wylight_types::Endpoint;

use crate::events::{ChangeReceiver, ChangeSender, ListChange};
use crate::traits::ResultSink;

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 100;

/// Ordered, deduplicated list of endpoints with change notifications.
#[derive(Debug)]
pub struct EndpointList {
    entries: Vec<Endpoint>,
    positions: HashMap<SocketAddr, usize>,
    changes: ChangeSender,
}

impl Default for EndpointList {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointList {
    /// Create an empty list.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            changes,
        }
    }

    /// Create a list holding `endpoints` in order.
    pub fn from_endpoints(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        let mut list = Self::new();
        list.load(endpoints);
        list
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }

    /// Add known endpoints (e.g. from the recent store) in bulk.
    ///
    /// Endpoints already listed are merged in place. Observers get a single
    /// [`ListChange::Loaded`].
    pub fn load(&mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> usize {
        let before = self.entries.len();
        for endpoint in endpoints {
            self.upsert(endpoint);
        }
        let added = self.entries.len() - before;
        self.notify(ListChange::Loaded { count: added });
        added
    }

    /// Set the online flag of every entry, keeping all of them listed.
    pub fn reset(&mut self, online: bool) {
        for entry in &mut self.entries {
            entry.online = online;
        }
        self.notify(ListChange::Reset { online });
    }

    /// Mark every entry offline before a new scan.
    pub fn mark_all_offline(&mut self) {
        self.reset(false);
    }

    /// Merge a sighting: update in place when the address is known,
    /// append otherwise. Observers get exactly one notification.
    pub fn found(&mut self, endpoint: Endpoint) -> ListChange {
        let change = self.upsert(endpoint);
        self.notify(change);
        change
    }

    fn upsert(&mut self, endpoint: Endpoint) -> ListChange {
        if let Some(&index) = self.positions.get(&endpoint.address) {
            self.entries[index].merge(&endpoint);
            ListChange::Updated { index }
        } else {
            let index = self.entries.len();
            self.positions.insert(endpoint.address, index);
            self.entries.push(endpoint);
            ListChange::Appended { index }
        }
    }

    fn notify(&self, change: ListChange) {
        debug!("Endpoint list changed: {:?}", change);
        // Ignore error if no receivers
        let _ = self.changes.send(change);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&Endpoint> {
        self.entries.get(index)
    }

    /// Entry with the given address.
    pub fn find(&self, address: &SocketAddr) -> Option<&Endpoint> {
        self.position(address).map(|i| &self.entries[i])
    }

    /// Position of the entry with the given address.
    pub fn position(&self, address: &SocketAddr) -> Option<usize> {
        self.positions.get(address).copied()
    }

    /// Mutable access for bookkeeping fields such as the score.
    ///
    /// The address must not be changed through this reference.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Endpoint> {
        self.entries.get_mut(index)
    }

    /// Iterate entries in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.entries.iter()
    }

    /// Number of entries confirmed online.
    pub fn online_count(&self) -> usize {
        self.entries.iter().filter(|e| e.online).count()
    }

    /// Entries in display order.
    pub fn as_slice(&self) -> &[Endpoint] {
        &self.entries
    }
}

impl ResultSink for EndpointList {
    fn on_endpoint_found(&mut self, endpoint: Endpoint) {
        self.found(endpoint);
    }
}

impl<'a> IntoIterator for &'a EndpointList {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(address: &str, name: &str) -> Endpoint {
        Endpoint::new(address.parse().unwrap(), name)
    }

    fn seen(address: &str, name: &str) -> Endpoint {
        Endpoint::discovered(address.parse().unwrap(), name)
    }

    #[test]
    fn test_append_then_update_in_place() {
        let mut list = EndpointList::new();
        assert_eq!(
            list.found(seen("10.0.0.1:2000", "A")),
            ListChange::Appended { index: 0 }
        );
        assert_eq!(
            list.found(seen("10.0.0.2:2000", "B")),
            ListChange::Appended { index: 1 }
        );
        assert_eq!(
            list.found(seen("10.0.0.1:2000", "A-renamed")),
            ListChange::Updated { index: 0 }
        );

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().name, "A-renamed");
        assert_eq!(list.get(1).unwrap().name, "B");
    }

    #[test]
    fn test_reset_keeps_entries() {
        let mut list = EndpointList::from_endpoints([
            seen("10.0.0.1:2000", "A"),
            seen("10.0.0.2:2000", "B"),
        ]);
        assert_eq!(list.online_count(), 2);

        list.mark_all_offline();

        assert_eq!(list.len(), 2);
        assert_eq!(list.online_count(), 0);
    }

    #[test]
    fn test_refound_entry_comes_back_online_in_place() {
        let mut list = EndpointList::from_endpoints([
            known("10.0.0.1:2000", "A"),
            known("10.0.0.2:2000", "B"),
        ]);
        list.mark_all_offline();

        list.found(seen("10.0.0.2:2000", "B"));
        list.found(seen("10.0.0.3:2000", "C"));

        let state: Vec<_> = list.iter().map(|e| (e.name.as_str(), e.online)).collect();
        assert_eq!(state, [("A", false), ("B", true), ("C", true)]);
    }

    #[test]
    fn test_load_merges_duplicates() {
        let mut list = EndpointList::new();
        let added = list.load([
            known("10.0.0.1:2000", "A"),
            known("10.0.0.1:2000", "A2"),
            known("10.0.0.2:2000", "B"),
        ]);
        assert_eq!(added, 2);
        assert_eq!(list.get(0).unwrap().name, "A2");
    }

    #[test]
    fn test_find_by_address() {
        let list = EndpointList::from_endpoints([known("10.0.0.1:2000", "A")]);
        let address = "10.0.0.1:2000".parse().unwrap();
        assert_eq!(list.find(&address).unwrap().name, "A");
        assert_eq!(list.position(&address), Some(0));
        assert!(list.find(&"10.0.0.1:2001".parse().unwrap()).is_none());
    }

    #[test]
    fn test_one_notification_per_mutation() {
        let mut list = EndpointList::new();
        let mut changes = list.subscribe();

        list.load([known("10.0.0.1:2000", "A")]);
        list.mark_all_offline();
        list.on_endpoint_found(seen("10.0.0.1:2000", "A"));
        list.on_endpoint_found(seen("10.0.0.2:2000", "B"));

        assert_eq!(changes.try_recv().unwrap(), ListChange::Loaded { count: 1 });
        assert_eq!(
            changes.try_recv().unwrap(),
            ListChange::Reset { online: false }
        );
        assert_eq!(changes.try_recv().unwrap(), ListChange::Updated { index: 0 });
        assert_eq!(
            changes.try_recv().unwrap(),
            ListChange::Appended { index: 1 }
        );
        assert!(changes.try_recv().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any sequence of sightings leaves one entry per address, ordered by
        /// first appearance.
        #[test]
        fn entries_unique_in_first_seen_order(hosts in proptest::collection::vec(0u8..16, 0..64)) {
            let mut list = EndpointList::new();
            for host in &hosts {
                let address = SocketAddr::from(([10, 0, 0, *host], 2000));
                list.on_endpoint_found(Endpoint::discovered(address, format!("n{}", host)));
            }

            let mut expected: Vec<u8> = Vec::new();
            for host in &hosts {
                if !expected.contains(host) {
                    expected.push(*host);
                }
            }
            let actual: Vec<u8> = list
                .iter()
                .map(|e| match e.ip() {
                    std::net::IpAddr::V4(ip) => ip.octets()[3],
                    std::net::IpAddr::V6(_) => unreachable!(),
                })
                .collect();
            prop_assert_eq!(actual, expected);
        }

        /// A reset never changes order or length.
        #[test]
        fn reset_preserves_order(hosts in proptest::collection::vec(0u8..16, 0..32)) {
            let mut list = EndpointList::new();
            for host in &hosts {
                list.on_endpoint_found(Endpoint::discovered(SocketAddr::from(([10, 0, 0, *host], 2000)), ""));
            }
            let before: Vec<SocketAddr> = list.iter().map(|e| e.address).collect();
            list.mark_all_offline();
            let after: Vec<SocketAddr> = list.iter().map(|e| e.address).collect();
            prop_assert_eq!(before, after);
            prop_assert_eq!(list.online_count(), 0);
        }
    }
}
