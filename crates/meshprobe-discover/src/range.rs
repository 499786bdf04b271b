//! Address range derivation.
//!
//! The scan range is the local host's own IPv4 address widened to a /24.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ipnet::Ipv4Net;
use tokio::net::UdpSocket;

use crate::error::{DiscoverError, Result};

/// Prefix length the scan widens the local address to.
pub const SCAN_PREFIX_LEN: u8 = 24;

/// Public address used to pick the outbound interface. Nothing is sent to it.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// The subnet a scan covers, fixed for the duration of the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRange {
    local: Ipv4Addr,
    network: Ipv4Net,
}

impl AddressRange {
    /// Widen `local` to its /24.
    pub fn from_local(local: Ipv4Addr) -> Result<Self> {
        Self::with_prefix(local, SCAN_PREFIX_LEN)
    }

    pub fn with_prefix(local: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        let network = Ipv4Net::new(local, prefix_len)
            .map_err(|e| DiscoverError::Range(e.to_string()))?
            .trunc();
        Ok(Self { local, network })
    }

    /// Detect the local address and widen it to a /24.
    pub async fn detect() -> Result<Self> {
        let local = local_ipv4().await?;
        tracing::debug!(local = %local, "Detected local address");
        Self::from_local(local)
    }

    pub fn local(&self) -> Ipv4Addr {
        self.local
    }

    pub fn network(&self) -> Ipv4Net {
        self.network
    }

    /// The first `max` host addresses of the subnet, in ascending order.
    pub fn candidates(&self, max: usize) -> Vec<Ipv4Addr> {
        self.network.hosts().take(max).collect()
    }
}

/// Local IPv4 address of the interface that routes to the internet.
///
/// Connecting a UDP socket only selects a route; no packet leaves the host.
pub async fn local_ipv4() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket
        .connect(ROUTE_PROBE)
        .await
        .map_err(|e| DiscoverError::NoLocalAddress(e.to_string()))?;

    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
        other => Err(DiscoverError::NoLocalAddress(format!(
            "no routable IPv4 address (got {other})"
        ))),
    }
}
