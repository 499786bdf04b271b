//! Connection resolution.
//!
//! A connection request is an ordered list of [`Strategy`] values. The first
//! one that yields a configured device wins; if none do, the error carries
//! one [`Attempt`] per strategy explaining why it failed.

use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;
use meshprobe_core::types::ConnectedVia;
use meshprobe_discover::connectivity::resolve_host;
use meshprobe_discover::{AddressRange, NetworkScanner, ProbeMode, ScanConfig};

use crate::config::{DeviceConfig, StrategyKind};
use crate::device::{LinkSettings, MeshtasticLink};
use crate::error::{Attempt, RadioError, Result};
use crate::link::MeshLink;
use crate::serial;

/// One way of finding the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Resolve each hostname in turn and connect over TCP.
    Hostnames(Vec<String>),
    /// Scan the local /24 for the API port and connect to the first device that answers.
    NetworkScan,
    /// Connect to an explicit host over TCP.
    Tcp(String),
    /// Connect over serial: the given port, or each discovered candidate.
    Serial(Option<String>),
}

impl Strategy {
    /// The strategy list a [`DeviceConfig`] describes.
    pub fn from_config(config: &DeviceConfig) -> Vec<Strategy> {
        config
            .strategies
            .iter()
            .map(|kind| match kind {
                StrategyKind::Hostnames => Strategy::Hostnames(config.hostnames.clone()),
                StrategyKind::Scan => Strategy::NetworkScan,
                StrategyKind::Serial => Strategy::Serial(None),
            })
            .collect()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hostnames(_) => write!(f, "hostnames"),
            Self::NetworkScan => write!(f, "scan"),
            Self::Tcp(host) => write!(f, "tcp {host}"),
            Self::Serial(Some(port)) => write!(f, "serial {port}"),
            Self::Serial(None) => write!(f, "serial"),
        }
    }
}

/// A configured device and how it was reached.
pub struct Connection {
    pub via: ConnectedVia,
    pub link: Box<dyn MeshLink>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("via", &self.via).finish()
    }
}

/// The system operations resolution relies on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn resolve_host(&self, host: &str) -> Option<IpAddr>;

    /// Addresses on the local network with the device API port open.
    async fn scan_for_api(&self) -> Result<Vec<IpAddr>>;

    fn serial_ports(&self) -> Vec<String>;

    async fn connect_tcp(&self, host: &str) -> Result<Box<dyn MeshLink>>;

    async fn connect_serial(&self, port: &str) -> Result<Box<dyn MeshLink>>;
}

/// Try `strategies` in order and return the first configured device.
pub async fn resolve(strategies: &[Strategy], backend: &dyn Backend) -> Result<Connection> {
    let mut attempts = Vec::new();

    for strategy in strategies {
        tracing::debug!(strategy = %strategy, "Trying connection strategy");
        match attempt(strategy, backend).await {
            Ok(connection) => {
                tracing::info!(via = %connection.via, "Connected to device");
                return Ok(connection);
            }
            Err(reason) => {
                tracing::info!(strategy = %strategy, reason = %reason, "Connection strategy failed");
                attempts.push(Attempt {
                    strategy: strategy.to_string(),
                    reason,
                });
            }
        }
    }

    Err(RadioError::NoDevice { attempts })
}

/// Run one strategy. The error is a human-readable reason.
async fn attempt(strategy: &Strategy, backend: &dyn Backend) -> std::result::Result<Connection, String> {
    match strategy {
        Strategy::Hostnames(hosts) => {
            if hosts.is_empty() {
                return Err("no hostnames configured".to_string());
            }
            let mut failures = Vec::new();
            for host in hosts {
                let Some(address) = backend.resolve_host(host).await else {
                    failures.push(format!("{host} did not resolve"));
                    continue;
                };
                match backend.connect_tcp(&address.to_string()).await {
                    Ok(link) => {
                        return Ok(Connection {
                            via: ConnectedVia::Hostname {
                                host: host.clone(),
                                address,
                            },
                            link,
                        })
                    }
                    Err(e) => failures.push(format!("{host} ({address}): {e}")),
                }
            }
            Err(failures.join(", "))
        }

        Strategy::NetworkScan => {
            let addresses = backend.scan_for_api().await.map_err(|e| e.to_string())?;
            if addresses.is_empty() {
                return Err("no device API port found on the local network".to_string());
            }
            let mut failures = Vec::new();
            for address in addresses {
                match backend.connect_tcp(&address.to_string()).await {
                    Ok(link) => {
                        return Ok(Connection {
                            via: ConnectedVia::NetworkScan { address },
                            link,
                        })
                    }
                    Err(e) => failures.push(format!("{address}: {e}")),
                }
            }
            Err(failures.join(", "))
        }

        Strategy::Tcp(host) => backend
            .connect_tcp(host)
            .await
            .map(|link| Connection {
                via: ConnectedVia::Tcp { host: host.clone() },
                link,
            })
            .map_err(|e| e.to_string()),

        Strategy::Serial(port) => {
            let ports = match port {
                Some(port) => vec![port.clone()],
                None => backend.serial_ports(),
            };
            if ports.is_empty() {
                return Err("no serial ports found".to_string());
            }
            let mut failures = Vec::new();
            for port in ports {
                match backend.connect_serial(&port).await {
                    Ok(link) => {
                        return Ok(Connection {
                            via: ConnectedVia::Serial { port },
                            link,
                        })
                    }
                    Err(e) => failures.push(format!("{port}: {e}")),
                }
            }
            Err(failures.join(", "))
        }
    }
}

/// The real network, serial ports and device library.
pub struct SystemBackend {
    device: DeviceConfig,
    scan: ScanConfig,
}

impl SystemBackend {
    pub fn new(device: DeviceConfig, scan: ScanConfig) -> Self {
        Self { device, scan }
    }
}

#[async_trait]
impl Backend for SystemBackend {
    async fn resolve_host(&self, host: &str) -> Option<IpAddr> {
        resolve_host(host, self.device.resolve_timeout()).await
    }

    async fn scan_for_api(&self) -> Result<Vec<IpAddr>> {
        let range = AddressRange::detect().await?;
        let scanner = NetworkScanner::new(&self.scan)?.with_mode(ProbeMode::ApiOnly);
        let report = scanner.scan(&range, |_| {}).await;
        Ok(report.api_addresses())
    }

    fn serial_ports(&self) -> Vec<String> {
        serial::candidate_ports(&self.device.preferred_serial_port)
    }

    async fn connect_tcp(&self, host: &str) -> Result<Box<dyn MeshLink>> {
        let link =
            MeshtasticLink::connect_tcp(host, self.scan.api_port, LinkSettings::from(&self.device))
                .await?;
        Ok(Box::new(link))
    }

    async fn connect_serial(&self, port: &str) -> Result<Box<dyn MeshLink>> {
        let link = MeshtasticLink::connect_serial(port, LinkSettings::from(&self.device)).await?;
        Ok(Box::new(link))
    }
}
