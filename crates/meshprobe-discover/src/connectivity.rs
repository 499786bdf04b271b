//! Basic reachability checks run before a scan.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

/// Public DNS resolver used as the internet reachability target.
pub const INTERNET_TARGET: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);

pub const INTERNET_TIMEOUT: Duration = Duration::from_secs(3);

/// Whether a TCP connection to the public resolver succeeds within `limit`.
pub async fn check_internet(limit: Duration) -> bool {
    check_tcp(INTERNET_TARGET, limit).await
}

pub async fn check_tcp(target: SocketAddr, limit: Duration) -> bool {
    matches!(timeout(limit, TcpStream::connect(target)).await, Ok(Ok(_)))
}

/// Resolve `host` to an address, preferring IPv4.
///
/// Returns `None` when the name does not resolve or resolution takes longer
/// than `limit` (mDNS names often hang rather than fail).
pub async fn resolve_host(host: &str, limit: Duration) -> Option<IpAddr> {
    let addrs: Vec<SocketAddr> = match timeout(limit, lookup_host((host, 0))).await {
        Ok(Ok(addrs)) => addrs.collect(),
        Ok(Err(e)) => {
            tracing::debug!(host, error = %e, "Hostname did not resolve");
            return None;
        }
        Err(_) => {
            tracing::debug!(host, "Hostname resolution timed out");
            return None;
        }
    };

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or(addrs.first())
        .map(SocketAddr::ip)
}
