//! Configuration for locating and talking to the device.

use std::time::Duration;

use serde::Deserialize;

/// Device configuration.
///
/// Loaded from the `[device]` section of `meshprobe.toml` or
/// `MESHPROBE__DEVICE__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Hostnames tried, in order, by the `hostnames` strategy.
    #[serde(default = "default_hostnames")]
    pub hostnames: Vec<String>,

    /// Serial port used first when it exists.
    #[serde(default = "default_preferred_serial_port")]
    pub preferred_serial_port: String,

    /// Connection strategies, in the order they are tried.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    /// How long to wait for the device's configuration burst after connecting.
    #[serde(default = "default_config_timeout_secs")]
    pub config_timeout_secs: u64,

    /// Bound on each hostname lookup, in milliseconds.
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Channel index outgoing messages are sent on.
    #[serde(default)]
    pub channel: u32,

    /// Ask the mesh to acknowledge outgoing messages.
    #[serde(default)]
    pub want_ack: bool,

    /// Message the `status` command broadcasts.
    #[serde(default = "default_test_message")]
    pub test_message: String,
}

/// One way of finding the device.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Resolve the configured hostnames and connect over TCP.
    Hostnames,
    /// Scan the local /24 for the API port and connect over TCP.
    Scan,
    /// Connect over a USB serial port.
    Serial,
}

impl DeviceConfig {
    pub fn config_timeout(&self) -> Duration {
        Duration::from_secs(self.config_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

fn default_hostnames() -> Vec<String> {
    vec![
        "meshtastic.local".to_string(),
        "meshtastic".to_string(),
        "heltec.local".to_string(),
    ]
}

fn default_preferred_serial_port() -> String {
    "/dev/cu.usbserial-0001".to_string()
}

fn default_strategies() -> Vec<StrategyKind> {
    vec![StrategyKind::Hostnames, StrategyKind::Scan, StrategyKind::Serial]
}

fn default_config_timeout_secs() -> u64 {
    10
}

fn default_resolve_timeout_ms() -> u64 {
    2000
}

fn default_test_message() -> String {
    "Hello from Heltec V2! 🚀".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostnames: default_hostnames(),
            preferred_serial_port: default_preferred_serial_port(),
            strategies: default_strategies(),
            config_timeout_secs: default_config_timeout_secs(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
            channel: 0,
            want_ack: false,
            test_message: default_test_message(),
        }
    }
}
