//! Per-address service probes.
//!
//! Three independent probes run for every address: a TCP connect to the
//! device API port, an HTTP GET and an HTTPS GET. Each is bounded by its own
//! timeout and any failure (timeout, refused, DNS, TLS) only marks that
//! probe as failed.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use meshprobe_core::types::ProbeResult;
use reqwest::StatusCode;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ScanConfig;
use crate::error::Result;

/// Marker the device firmware puts in its web interface.
const FIRMWARE_MARKER: &str = "meshtastic";

/// Runs the three probes for one address.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    api_port: u16,
    http_port: u16,
    https_port: u16,
    tcp_timeout: Duration,
    preview_chars: usize,
}

impl Prober {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        // Devices serve self-signed certificates on their local web interface.
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .danger_accept_invalid_certs(true)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            api_port: config.api_port,
            http_port: config.http_port,
            https_port: config.https_port,
            tcp_timeout: config.tcp_timeout(),
            preview_chars: config.preview_chars,
        })
    }

    /// Run all three probes against `address`, one after another.
    pub async fn probe(&self, address: IpAddr) -> ProbeResult {
        let mut result = ProbeResult::new(address);

        result.api = self.probe_api(address).await;

        if let Some(body) = self.probe_web(address, "http", self.http_port, 80).await {
            result.http = true;
            result.http_preview = Some(preview(&body, self.preview_chars));
        }

        result.https = self
            .probe_web(address, "https", self.https_port, 443)
            .await
            .is_some();

        tracing::trace!(
            address = %address,
            api = result.api,
            http = result.http,
            https = result.https,
            "Probed address"
        );

        result
    }

    /// TCP connect to the device API port.
    pub async fn probe_api(&self, address: IpAddr) -> bool {
        let target = SocketAddr::new(address, self.api_port);
        match timeout(self.tcp_timeout, TcpStream::connect(target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::trace!(target = %target, error = %e, "API port closed");
                false
            }
            Err(_) => {
                tracing::trace!(target = %target, "API port probe timed out");
                false
            }
        }
    }

    /// GET the web root. Returns the body when the device answered with
    /// `200 OK` or a page that mentions the firmware.
    async fn probe_web(
        &self,
        address: IpAddr,
        scheme: &str,
        port: u16,
        default_port: u16,
    ) -> Option<String> {
        let url = web_url(scheme, address, port, default_port);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::trace!(url = %url, error = %e, "Web probe failed");
                return None;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::trace!(url = %url, error = %e, "Web probe body unreadable");
                return None;
            }
        };

        if status == StatusCode::OK || body.to_lowercase().contains(FIRMWARE_MARKER) {
            Some(body)
        } else {
            None
        }
    }
}

/// Build the probe URL, leaving the port out when it is the scheme default.
pub fn web_url(scheme: &str, address: IpAddr, port: u16, default_port: u16) -> String {
    let host = match address {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    };
    if port == default_port {
        format!("{scheme}://{host}")
    } else {
        format!("{scheme}://{host}:{port}")
    }
}

/// First `max_chars` characters of `body`.
pub fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Loopback servers for probe and scanner tests.

    use std::net::SocketAddr;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts connections and never answers.
    pub async fn silent_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        addr
    }

    /// Answers every request with the given status line and body.
    pub async fn http_server(status: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {status}\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        addr
    }

    /// A loopback port with nothing listening on it.
    pub async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }
}
