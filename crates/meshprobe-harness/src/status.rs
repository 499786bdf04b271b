//! Device status parsed from the `status` tool's console output.
//!
//! Matching is by line label, so decoration around the labels (colors,
//! indentation) does not matter.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DeviceStatus {
    pub connected: bool,
    pub node_name: Option<String>,
    pub node_id: Option<String>,
    pub battery: Option<u32>,
    pub voltage: Option<f32>,
    pub mesh_nodes: usize,
    pub wifi_configured: bool,
}

/// Rough mesh health from the number of nodes the device knows.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NetworkHealth {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl NetworkHealth {
    pub fn from_node_count(nodes: usize) -> Self {
        match nodes {
            n if n > 3 => Self::Excellent,
            n if n > 1 => Self::Good,
            n if n > 0 => Self::Fair,
            _ => Self::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl DeviceStatus {
    pub fn parse(output: &str) -> Self {
        let mut status = Self::default();

        for line in output.lines() {
            if line.contains("Connected!") || line.contains("Connected successfully") {
                status.connected = true;
            }
            if line.contains("WiFi configuration found") {
                status.wifi_configured = true;
            }

            if let Some(rest) = after_label(line, "Node: ") {
                if let Some((name, id)) = rest.rsplit_once(" (") {
                    status.node_name = Some(name.trim().to_string());
                    status.node_id = Some(id.trim_end_matches(')').trim().to_string());
                }
            } else if let Some(rest) = after_label(line, "Battery: ") {
                status.battery = rest.trim_end_matches('%').trim().parse().ok();
            } else if let Some(rest) = after_label(line, "Voltage: ") {
                status.voltage = rest.trim_end_matches('V').trim().parse().ok();
            } else if let Some(rest) = after_label(line, "Mesh nodes: ") {
                status.mesh_nodes = rest
                    .split_whitespace()
                    .next()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(0);
            }
        }

        status
    }

    pub fn health(&self) -> NetworkHealth {
        NetworkHealth::from_node_count(self.mesh_nodes)
    }
}

/// The text after `label` when the line starts with it (ignoring leading
/// decoration up to the label).
fn after_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let start = line.find(label)?;
    let prefix = &line[..start];
    if prefix.chars().any(|c| c.is_alphanumeric()) {
        return None;
    }
    Some(line[start + label.len()..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_OUTPUT: &str = "\
Connecting to device...
Connected! (serial /dev/ttyUSB0)

Device Status:
Node: Hilltop Base (!1a2b3c4d)
Battery: 87%
Voltage: 4.10V
Uptime: 3h 12m
Mesh nodes: 4 discovered
Primary channel: LongFast (index 0, encryption enabled)

WiFi Status Check:
WiFi configuration found (enabled)
";

    #[test]
    fn test_parse_full_status() {
        let status = DeviceStatus::parse(STATUS_OUTPUT);
        assert!(status.connected);
        assert_eq!(status.node_name.as_deref(), Some("Hilltop Base"));
        assert_eq!(status.node_id.as_deref(), Some("!1a2b3c4d"));
        assert_eq!(status.battery, Some(87));
        assert_eq!(status.voltage, Some(4.1));
        assert_eq!(status.mesh_nodes, 4);
        assert!(status.wifi_configured);
        assert_eq!(status.health(), NetworkHealth::Excellent);
    }

    #[test]
    fn test_parse_partial_status() {
        let status = DeviceStatus::parse("Connected! (tcp radio.lan)\nNode: Unknown (Unknown)\nMesh nodes: 0 discovered\n");
        assert!(status.connected);
        assert_eq!(status.node_name.as_deref(), Some("Unknown"));
        assert!(status.battery.is_none());
        assert!(status.voltage.is_none());
        assert!(!status.wifi_configured);
        assert_eq!(status.health(), NetworkHealth::Poor);
    }

    #[test]
    fn test_decorated_labels() {
        let status = DeviceStatus::parse("  * Battery: 55%\n  Mesh nodes: 2 discovered");
        assert_eq!(status.battery, Some(55));
        assert_eq!(status.mesh_nodes, 2);
    }

    #[test]
    fn test_label_inside_other_text_ignored() {
        let status = DeviceStatus::parse("My Node: Base (!00000001)\nPrimary channel: x");
        assert!(status.node_name.is_none());
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(DeviceStatus::parse(""), DeviceStatus::default());
    }

    #[test]
    fn test_health_grades() {
        assert_eq!(NetworkHealth::from_node_count(0), NetworkHealth::Poor);
        assert_eq!(NetworkHealth::from_node_count(1), NetworkHealth::Fair);
        assert_eq!(NetworkHealth::from_node_count(2), NetworkHealth::Good);
        assert_eq!(NetworkHealth::from_node_count(3), NetworkHealth::Good);
        assert_eq!(NetworkHealth::from_node_count(4), NetworkHealth::Excellent);
        assert_eq!(NetworkHealth::Fair.as_str(), "fair");
    }
}
