//! Core domain types shared by the discovery, radio and CLI crates.
//!
//! Nothing here talks to the network or to a device; these are the plain
//! values the other crates produce and print.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MeshprobeError;

// ── Node identity ─────────────────────────────────────────────────

/// A mesh node number. Displayed the way the firmware names nodes: `!1a2b3c4d`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeNum(pub u32);

impl NodeNum {
    /// Node number the firmware uses for "every node".
    pub const BROADCAST: NodeNum = NodeNum(u32::MAX);
}

impl fmt::Display for NodeNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{:08x}", self.0)
    }
}

impl FromStr for NodeNum {
    type Err = MeshprobeError;

    /// Accepts `!1a2b3c4d`, `0x1a2b3c4d` or a decimal node number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let parsed = if let Some(hex) = raw.strip_prefix('!') {
            u32::from_str_radix(hex, 16)
        } else if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            u32::from_str_radix(hex, 16)
        } else {
            raw.parse::<u32>()
        };
        parsed
            .map(NodeNum)
            .map_err(|_| MeshprobeError::InvalidNodeId(s.to_string()))
    }
}

/// Where an outgoing text message goes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    #[default]
    Broadcast,
    Node(NodeNum),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => write!(f, "broadcast"),
            Self::Node(num) => write!(f, "{num}"),
        }
    }
}

// ── Device state ──────────────────────────────────────────────────

/// Telemetry a node reports about itself. Every field is optional because
/// firmware only fills what the board can measure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceMetrics {
    pub battery_level: Option<u32>,
    pub voltage: Option<f32>,
    pub channel_utilization: Option<f32>,
    pub air_util_tx: Option<f32>,
    pub uptime_seconds: Option<u32>,
}

impl DeviceMetrics {
    pub fn is_empty(&self) -> bool {
        self.battery_level.is_none()
            && self.voltage.is_none()
            && self.channel_utilization.is_none()
            && self.air_util_tx.is_none()
            && self.uptime_seconds.is_none()
    }

    /// Uptime as `"{h}h {m}m"`.
    pub fn uptime_display(&self) -> Option<String> {
        self.uptime_seconds.map(|secs| {
            let hours = secs / 3600;
            let minutes = (secs % 3600) / 60;
            format!("{hours}h {minutes}m")
        })
    }
}

/// One entry of the device's node database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSummary {
    pub num: NodeNum,
    pub user_id: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub hw_model: Option<String>,
    pub last_heard: Option<DateTime<Utc>>,
    pub snr: Option<f32>,
    pub metrics: Option<DeviceMetrics>,
}

impl NodeSummary {
    pub fn new(num: NodeNum) -> Self {
        Self {
            num,
            user_id: None,
            long_name: None,
            short_name: None,
            hw_model: None,
            last_heard: None,
            snr: None,
            metrics: None,
        }
    }

    /// Long name, then short name, then `"Unknown"`.
    pub fn display_name(&self) -> &str {
        self.long_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.short_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("Unknown")
    }

    /// The user id string if the node announced one, else the formatted node number.
    pub fn id_string(&self) -> String {
        match self.user_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.num.to_string(),
        }
    }
}

/// Summary of a channel slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelSummary {
    pub index: i32,
    pub name: String,
    pub encrypted: bool,
}

/// Everything known about the connected device after the config handshake.
///
/// All parts are optional: a device can be reachable while its node database
/// or config is not.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceSnapshot {
    pub my_node: Option<NodeNum>,
    pub nodes: Vec<NodeSummary>,
    pub primary_channel: Option<ChannelSummary>,
    pub wifi_enabled: Option<bool>,
}

impl DeviceSnapshot {
    /// The connected node's own entry, if the node database has it.
    pub fn my_info(&self) -> Option<&NodeSummary> {
        let me = self.my_node?;
        self.nodes.iter().find(|n| n.num == me)
    }
}

/// A decoded text message received from the mesh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextMessage {
    pub from: NodeNum,
    pub to: NodeNum,
    pub channel: u32,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl TextMessage {
    pub fn is_broadcast(&self) -> bool {
        self.to == NodeNum::BROADCAST
    }
}

// ── Discovery ─────────────────────────────────────────────────────

/// Outcome of probing one address for device services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeResult {
    pub address: IpAddr,
    /// The device API port accepted a TCP connection.
    pub api: bool,
    /// The HTTP web interface answered.
    pub http: bool,
    /// The HTTPS web interface answered.
    pub https: bool,
    /// Leading characters of the HTTP body, when HTTP answered.
    pub http_preview: Option<String>,
}

impl ProbeResult {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            api: false,
            http: false,
            https: false,
            http_preview: None,
        }
    }

    /// At least one probe succeeded.
    pub fn is_hit(&self) -> bool {
        self.api || self.http || self.https
    }
}

/// How a device connection was established.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum ConnectedVia {
    /// A well-known hostname resolved to an address with the API port open.
    Hostname { host: String, address: IpAddr },
    /// The local network scan found the API port open.
    NetworkScan { address: IpAddr },
    /// An explicitly requested TCP host.
    Tcp { host: String },
    /// A USB serial port.
    Serial { port: String },
}

impl fmt::Display for ConnectedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hostname { host, address } => write!(f, "hostname {host} ({address})"),
            Self::NetworkScan { address } => write!(f, "network scan ({address})"),
            Self::Tcp { host } => write!(f, "TCP {host}"),
            Self::Serial { port } => write!(f, "serial {port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_node_num_display() {
        assert_eq!(NodeNum(0x1a2b3c4d).to_string(), "!1a2b3c4d");
        assert_eq!(NodeNum(0x42).to_string(), "!00000042");
    }

    #[test]
    fn test_node_num_parse() {
        assert_eq!("!1a2b3c4d".parse::<NodeNum>().unwrap(), NodeNum(0x1a2b3c4d));
        assert_eq!("0xFF".parse::<NodeNum>().unwrap(), NodeNum(255));
        assert_eq!("1234".parse::<NodeNum>().unwrap(), NodeNum(1234));
        assert!("!zz".parse::<NodeNum>().is_err());
        assert!("node".parse::<NodeNum>().is_err());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut node = NodeSummary::new(NodeNum(1));
        assert_eq!(node.display_name(), "Unknown");
        node.short_name = Some("HV2".to_string());
        assert_eq!(node.display_name(), "HV2");
        node.long_name = Some(String::new());
        assert_eq!(node.display_name(), "HV2");
        node.long_name = Some("Heltec V2".to_string());
        assert_eq!(node.display_name(), "Heltec V2");
    }

    #[test]
    fn test_id_string_falls_back_to_num() {
        let mut node = NodeSummary::new(NodeNum(0xabc));
        assert_eq!(node.id_string(), "!00000abc");
        node.user_id = Some("!deadbeef".to_string());
        assert_eq!(node.id_string(), "!deadbeef");
    }

    #[test]
    fn test_uptime_display() {
        let metrics = DeviceMetrics {
            uptime_seconds: Some(3 * 3600 + 25 * 60 + 9),
            ..Default::default()
        };
        assert_eq!(metrics.uptime_display().as_deref(), Some("3h 25m"));
        assert!(DeviceMetrics::default().is_empty());
        assert!(!metrics.is_empty());
    }

    #[test]
    fn test_snapshot_my_info() {
        let mut snapshot = DeviceSnapshot::default();
        assert!(snapshot.my_info().is_none());
        snapshot.nodes.push(NodeSummary::new(NodeNum(7)));
        snapshot.nodes.push(NodeSummary::new(NodeNum(9)));
        snapshot.my_node = Some(NodeNum(9));
        assert_eq!(snapshot.my_info().map(|n| n.num), Some(NodeNum(9)));
    }

    #[test]
    fn test_probe_result_hit() {
        let mut result = ProbeResult::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)));
        assert!(!result.is_hit());
        result.https = true;
        assert!(result.is_hit());
    }

    #[test]
    fn test_connected_via_tag() {
        let via = ConnectedVia::Serial {
            port: "/dev/ttyUSB0".to_string(),
        };
        let json = serde_json::to_string(&via).unwrap();
        assert!(json.contains("\"via\":\"serial\""));
        assert_eq!(via.to_string(), "serial /dev/ttyUSB0");
    }
}
