//! UDP listener for WiFly broadcasts.
//!
//! WiFly modules announce themselves with a 110-byte datagram on UDP port
//! 55555. The receiver binds that port (shared with other listeners on the
//! host) and turns every WiFly datagram into an [`Endpoint`].

use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use futures::StreamExt;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

use wylight_types::{BROADCAST_MESSAGE_LEN, BroadcastMessage, DEFAULT_BROADCAST_PORT, Endpoint};

use crate::error::{Error, Result};
use crate::transport::{DiscoveryTransport, EndpointStream};

/// Larger than a broadcast so oversized datagrams are seen as such
/// instead of being truncated to a valid length.
const RECV_BUFFER_LEN: usize = BROADCAST_MESSAGE_LEN * 4;

/// Discovery transport listening for WiFly UDP broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReceiver {
    bind: SocketAddr,
}

impl Default for BroadcastReceiver {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_PORT)
    }
}

impl BroadcastReceiver {
    /// Listen on all IPv4 interfaces on `port`.
    pub fn new(port: u16) -> Self {
        Self::with_bind_address(SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), port))
    }

    /// Listen on a specific local address.
    pub fn with_bind_address(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Listen on `bind`, rejecting addresses no broadcast can reach.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for port 0 or a non-IPv4 address;
    /// WiFly modules only broadcast over IPv4 to a fixed port.
    pub fn try_with_bind_address(bind: SocketAddr) -> Result<Self> {
        if bind.port() == 0 {
            return Err(Error::InvalidConfig(
                "broadcast port must not be 0".to_string(),
            ));
        }
        if !bind.is_ipv4() {
            return Err(Error::InvalidConfig(format!(
                "{} is not an IPv4 address",
                bind.ip()
            )));
        }
        Ok(Self::with_bind_address(bind))
    }

    /// The address the receiver binds when opened.
    pub fn bind_address(&self) -> SocketAddr {
        self.bind
    }

    fn bind_socket(&self) -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::for_address(self.bind), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket.set_reuse_port(true)?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&self.bind.into())?;
        UdpSocket::from_std(socket.into())
    }
}

/// Wait for the next WiFly datagram, skipping everything else.
async fn next_endpoint(socket: &UdpSocket, buf: &mut [u8]) -> Result<Endpoint> {
    loop {
        let (len, from) = socket.recv_from(buf).await?;
        match BroadcastMessage::parse_wifly(&buf[..len]) {
            Ok(msg) => {
                debug!("Broadcast from {}: {}", from, msg);
                return Ok(msg.endpoint(from.ip()));
            }
            Err(e) => trace!("Ignoring datagram from {}: {}", from, e),
        }
    }
}

#[async_trait]
impl DiscoveryTransport for BroadcastReceiver {
    async fn open(&self) -> Result<EndpointStream> {
        let socket = self
            .bind_socket()
            .map_err(|e| Error::unavailable(format!("cannot listen on {}: {}", self.bind, e)))?;
        info!("Listening for WiFly broadcasts on {}", self.bind);

        let stream = futures::stream::unfold(socket, |socket| async move {
            let mut buf = vec![0u8; RECV_BUFFER_LEN];
            let item = next_endpoint(&socket, &mut buf).await;
            Some((item, socket))
        });
        Ok(stream.boxed())
    }

    fn describe(&self) -> String {
        format!("UDP broadcast receiver on {}", self.bind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binds_broadcast_port() {
        let receiver = BroadcastReceiver::default();
        assert_eq!(
            receiver.bind_address(),
            "0.0.0.0:55555".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_try_with_bind_address_validates() {
        assert!(BroadcastReceiver::try_with_bind_address("10.0.0.5:55555".parse().unwrap()).is_ok());
        assert!(matches!(
            BroadcastReceiver::try_with_bind_address("0.0.0.0:0".parse().unwrap()),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            BroadcastReceiver::try_with_bind_address("[::1]:55555".parse().unwrap()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_describe_mentions_address() {
        let receiver = BroadcastReceiver::new(4242);
        assert!(receiver.describe().contains("0.0.0.0:4242"));
    }

    #[tokio::test]
    async fn test_skips_foreign_datagrams() {
        let receiver = BroadcastReceiver::with_bind_address("127.0.0.1:0".parse().unwrap());
        let socket = receiver.bind_socket().unwrap();
        let target = socket.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"StopThread\0", target).await.unwrap();
        let mut foreign = BroadcastMessage::default();
        foreign.device_id = "Chromecast".to_string();
        sender.send_to(&foreign.to_bytes(), target).await.unwrap();
        let mut wifly = BroadcastMessage::default();
        wifly.device_id = "WiFly-EZX".to_string();
        wifly.port = 2000;
        sender.send_to(&wifly.to_bytes(), target).await.unwrap();

        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        let endpoint = next_endpoint(&socket, &mut buf).await.unwrap();
        assert_eq!(endpoint.name, "WiFly-EZX");
        assert_eq!(endpoint.address, "127.0.0.1:2000".parse().unwrap());
    }

    #[tokio::test]
    async fn test_port_in_use_without_reuse_is_unavailable() {
        // A plain socket without SO_REUSEADDR holds the port exclusively.
        let holder = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let receiver = BroadcastReceiver::with_bind_address(holder.local_addr().unwrap());

        match receiver.open().await {
            Err(Error::DiscoveryUnavailable(reason)) => assert!(reason.contains("cannot listen")),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => {
                // Some platforms let SO_REUSEPORT share the port anyway.
            }
        }
    }
}
