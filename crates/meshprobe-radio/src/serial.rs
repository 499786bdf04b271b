//! USB serial port discovery.
//!
//! Candidates come from three places, in this order: the preferred port
//! when it exists, ports the OS enumerates whose description looks like a
//! USB-UART bridge, and device nodes under `/dev` matching known patterns.

use std::path::Path;

use serialport::SerialPortType;

/// Description keywords that mark a USB-UART bridge (case-insensitive).
const BRIDGE_KEYWORDS: [&str; 3] = ["cp210", "serial", "usb"];

/// Device node name prefixes scanned under `/dev`.
const DEVICE_NODE_PREFIXES: [&str; 3] = ["cu.usbserial", "ttyUSB", "ttyACM"];

/// A port as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub path: String,
    pub description: String,
}

impl PortInfo {
    /// Whether this port looks like the device's USB-UART bridge.
    pub fn is_bridge(&self) -> bool {
        if self.path.contains("usbserial") {
            return true;
        }
        let description = self.description.to_lowercase();
        BRIDGE_KEYWORDS.iter().any(|k| description.contains(k))
    }
}

/// Candidate serial ports for the device, most likely first.
pub fn candidate_ports(preferred: &str) -> Vec<String> {
    let preferred = Path::new(preferred).exists().then_some(preferred);
    let ports = candidates(preferred, &enumerate_ports(), device_nodes(Path::new("/dev")));
    tracing::debug!(count = ports.len(), ports = ?ports, "Serial port candidates");
    ports
}

/// Merge the three sources, keeping first occurrence order.
pub fn candidates(preferred: Option<&str>, enumerated: &[PortInfo], nodes: Vec<String>) -> Vec<String> {
    let mut ports: Vec<String> = Vec::new();
    let all = preferred
        .map(str::to_string)
        .into_iter()
        .chain(
            enumerated
                .iter()
                .filter(|p| p.is_bridge())
                .map(|p| p.path.clone()),
        )
        .chain(nodes);

    for port in all {
        if !ports.contains(&port) {
            ports.push(port);
        }
    }
    ports
}

/// Ports the OS reports. Enumeration failures yield an empty list.
pub fn enumerate_ports() -> Vec<PortInfo> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|p| PortInfo {
                description: describe(&p.port_type),
                path: p.port_name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Serial port enumeration failed");
            Vec::new()
        }
    }
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let parts: Vec<&str> = [usb.product.as_deref(), usb.manufacturer.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if parts.is_empty() {
                format!("USB {:04x}:{:04x}", usb.vid, usb.pid)
            } else {
                parts.join(" ")
            }
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => String::new(),
    }
}

/// Device nodes in `dir` whose names match a known USB serial prefix, sorted.
pub fn device_nodes(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Cannot list device nodes");
            return Vec::new();
        }
    };

    let mut nodes: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            DEVICE_NODE_PREFIXES.iter().any(|p| name.starts_with(p))
        })
        .map(|entry| entry.path().to_string_lossy().into_owned())
        .collect();
    nodes.sort();
    nodes
}
