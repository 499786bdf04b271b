//! Configuration for the local network scan.

use std::time::Duration;

use serde::Deserialize;

/// Scan configuration.
///
/// Loaded from the `[scan]` section of `meshprobe.toml` or
/// `MESHPROBE__SCAN__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// TCP port of the device API.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Port of the plain HTTP web interface.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Port of the HTTPS web interface.
    #[serde(default = "default_https_port")]
    pub https_port: u16,

    /// Timeout for the API port connect, in milliseconds.
    #[serde(default = "default_tcp_timeout_ms")]
    pub tcp_timeout_ms: u64,

    /// Timeout for each HTTP/HTTPS request, in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Upper bound on the number of addresses probed per scan.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Number of addresses probed concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How much of the HTTP body to keep, in characters.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl ScanConfig {
    pub fn tcp_timeout(&self) -> Duration {
        Duration::from_millis(self.tcp_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn default_api_port() -> u16 {
    4403
}

fn default_http_port() -> u16 {
    80
}

fn default_https_port() -> u16 {
    443
}

fn default_tcp_timeout_ms() -> u64 {
    1000
}

fn default_http_timeout_ms() -> u64 {
    2000
}

fn default_max_candidates() -> usize {
    100
}

fn default_workers() -> usize {
    50
}

fn default_preview_chars() -> usize {
    200
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            http_port: default_http_port(),
            https_port: default_https_port(),
            tcp_timeout_ms: default_tcp_timeout_ms(),
            http_timeout_ms: default_http_timeout_ms(),
            max_candidates: default_max_candidates(),
            workers: default_workers(),
            preview_chars: default_preview_chars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.api_port, 4403);
        assert_eq!(config.http_port, 80);
        assert_eq!(config.https_port, 443);
        assert_eq!(config.max_candidates, 100);
        assert_eq!(config.workers, 50);
        assert_eq!(config.tcp_timeout(), Duration::from_secs(1));
        assert_eq!(config.http_timeout(), Duration::from_secs(2));
    }
}
