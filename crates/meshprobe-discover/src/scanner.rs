//! Bounded fan-out/fan-in scan of a candidate set.
//!
//! One tokio task per candidate address; a semaphore caps how many run at
//! once. Each task owns its result and the collector drains the join set,
//! so no collection is shared between tasks.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ipnet::Ipv4Net;
use meshprobe_core::types::ProbeResult;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::ScanConfig;
use crate::error::Result;
use crate::probe::Prober;
use crate::range::AddressRange;

/// Result of one scan invocation.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// The subnet the candidates came from.
    pub subnet: Ipv4Net,
    /// The local address the subnet was derived from.
    pub local: Ipv4Addr,
    /// How many addresses were probed.
    pub probed: usize,
    /// Addresses where at least one probe succeeded, sorted by address.
    pub hits: Vec<ProbeResult>,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

impl ScanReport {
    /// Addresses with the device API port open.
    pub fn api_addresses(&self) -> Vec<IpAddr> {
        self.hits
            .iter()
            .filter(|h| h.api)
            .map(|h| h.address)
            .collect()
    }
}

/// Which probes run against each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// API port, HTTP and HTTPS.
    #[default]
    Full,
    /// API port only; used when looking for a device to connect to.
    ApiOnly,
}

/// Scans a bounded candidate set with a fixed-size worker pool.
pub struct NetworkScanner {
    prober: Arc<Prober>,
    workers: usize,
    max_candidates: usize,
    mode: ProbeMode,
}

impl NetworkScanner {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        Ok(Self {
            prober: Arc::new(Prober::new(config)?),
            workers: config.workers.max(1),
            max_candidates: config.max_candidates,
            mode: ProbeMode::Full,
        })
    }

    pub fn with_mode(mut self, mode: ProbeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }

    /// Probe a single address. `None` when nothing answered.
    pub async fn check_address(&self, address: IpAddr) -> Option<ProbeResult> {
        let result = self.prober.probe(address).await;
        result.is_hit().then_some(result)
    }

    /// Scan the first `max_candidates` hosts of `range`.
    ///
    /// `on_hit` runs once per hit, in completion order, on the calling task.
    pub async fn scan<F>(&self, range: &AddressRange, on_hit: F) -> ScanReport
    where
        F: FnMut(&ProbeResult),
    {
        let start = Instant::now();
        let candidates: Vec<IpAddr> = range
            .candidates(self.max_candidates)
            .into_iter()
            .map(IpAddr::V4)
            .collect();
        let probed = candidates.len();

        tracing::info!(
            subnet = %range.network(),
            local = %range.local(),
            candidates = probed,
            workers = self.workers,
            mode = ?self.mode,
            "Starting network scan"
        );

        let hits = self.scan_candidates(candidates, on_hit).await;
        let duration = start.elapsed();

        tracing::info!(
            subnet = %range.network(),
            hits = hits.len(),
            duration_ms = duration.as_millis(),
            "Network scan complete"
        );

        ScanReport {
            subnet: range.network(),
            local: range.local(),
            probed,
            hits,
            duration,
        }
    }

    /// Probe every address in `candidates` and return the hits sorted by address.
    pub async fn scan_candidates<F>(&self, candidates: Vec<IpAddr>, mut on_hit: F) -> Vec<ProbeResult>
    where
        F: FnMut(&ProbeResult),
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for address in candidates {
            let prober = self.prober.clone();
            let semaphore = semaphore.clone();
            let mode = self.mode;
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let result = match mode {
                    ProbeMode::Full => prober.probe(address).await,
                    ProbeMode::ApiOnly => {
                        let mut result = ProbeResult::new(address);
                        result.api = prober.probe_api(address).await;
                        result
                    }
                };
                result.is_hit().then_some(result)
            });
        }

        let mut hits = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(hit)) => {
                    tracing::debug!(address = %hit.address, "Device services found");
                    on_hit(&hit);
                    hits.push(hit);
                }
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "Probe task panicked"),
            }
        }

        hits.sort_by_key(|h| h.address);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::test_support::{closed_port, silent_server};

    async fn loopback_config(api_port: u16) -> ScanConfig {
        ScanConfig {
            api_port,
            http_port: closed_port().await,
            https_port: closed_port().await,
            tcp_timeout_ms: 300,
            http_timeout_ms: 300,
            workers: 4,
            ..Default::default()
        }
    }

    fn loopback_candidates(count: u8) -> Vec<IpAddr> {
        (1..=count)
            .map(|last| IpAddr::V4(Ipv4Addr::new(127, 0, 0, last)))
            .collect()
    }

    #[tokio::test]
    async fn test_no_reachable_hosts_yields_empty_set() {
        let scanner = NetworkScanner::new(&loopback_config(closed_port().await).await).unwrap();
        let mut seen = 0;
        let hits = scanner
            .scan_candidates(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)], |_| seen += 1)
            .await;
        assert!(hits.is_empty());
        assert_eq!(seen, 0);
    }

    #[tokio::test]
    async fn test_open_api_port_is_reported() {
        let api = silent_server().await;
        let scanner = NetworkScanner::new(&loopback_config(api.port()).await).unwrap();

        let mut seen = Vec::new();
        let hits = scanner
            .scan_candidates(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)], |hit| {
                seen.push(hit.address)
            })
            .await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(hits[0].api);
        assert_eq!(seen, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
    }

    #[tokio::test]
    async fn test_more_candidates_than_workers() {
        // The listener only binds 127.0.0.1; the other loopback addresses refuse.
        let api = silent_server().await;
        let scanner = NetworkScanner::new(&loopback_config(api.port()).await).unwrap();

        let hits = scanner.scan_candidates(loopback_candidates(12), |_| {}).await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_scan_is_repeatable() {
        let api = silent_server().await;
        let scanner = NetworkScanner::new(&loopback_config(api.port()).await).unwrap();

        let first = scanner.scan_candidates(loopback_candidates(6), |_| {}).await;
        let second = scanner.scan_candidates(loopback_candidates(6), |_| {}).await;

        let first: Vec<IpAddr> = first.iter().map(|h| h.address).collect();
        let second: Vec<IpAddr> = second.iter().map(|h| h.address).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_scan_report_respects_max_candidates() {
        let config = ScanConfig {
            max_candidates: 3,
            ..loopback_config(closed_port().await).await
        };
        let scanner = NetworkScanner::new(&config).unwrap();
        let range = AddressRange::with_prefix(Ipv4Addr::new(127, 0, 0, 1), 8).unwrap();

        let report = scanner.scan(&range, |_| {}).await;

        assert_eq!(report.probed, 3);
        assert_eq!(report.subnet.to_string(), "127.0.0.0/8");
        assert!(report.hits.is_empty());
        assert!(report.api_addresses().is_empty());
    }

    #[tokio::test]
    async fn test_api_only_mode_skips_web_probes() {
        let api = silent_server().await;
        let web = crate::probe::test_support::http_server("200 OK", "meshtastic").await;
        let config = ScanConfig {
            http_port: web.port(),
            ..loopback_config(api.port()).await
        };
        let scanner = NetworkScanner::new(&config)
            .unwrap()
            .with_mode(ProbeMode::ApiOnly);

        let hits = scanner
            .scan_candidates(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)], |_| {})
            .await;

        assert_eq!(hits.len(), 1);
        assert!(hits[0].api);
        assert!(!hits[0].http);
    }

    #[tokio::test]
    async fn test_check_address() {
        let api = silent_server().await;
        let scanner = NetworkScanner::new(&loopback_config(api.port()).await).unwrap();
        let hit = scanner.check_address(IpAddr::V4(Ipv4Addr::LOCALHOST)).await;
        assert!(hit.is_some_and(|h| h.api));

        let scanner = NetworkScanner::new(&loopback_config(closed_port().await).await).unwrap();
        assert!(scanner
            .check_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .is_none());
    }
}
