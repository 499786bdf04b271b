//! Harness configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{HarnessError, Result};

/// Name of the tool binary the harness exercises.
pub const TOOL_BINARY: &str = "meshprobe";

/// Loaded from the `[harness]` section of `meshprobe.toml` or
/// `MESHPROBE__HARNESS__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// Path to the `meshprobe` binary. Defaults to the one next to the harness.
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Length of the `monitor` case, in seconds.
    #[serde(default = "default_monitor_seconds")]
    pub monitor_seconds: u64,

    /// Connection flags passed to every tool. Unset means `--serial` with
    /// the device's preferred port; an empty list lets each tool resolve
    /// the device itself.
    #[serde(default)]
    pub connection_args: Option<Vec<String>>,
}

fn default_monitor_seconds() -> u64 {
    10
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            binary: None,
            monitor_seconds: default_monitor_seconds(),
            connection_args: None,
        }
    }
}

impl HarnessConfig {
    /// Global flags every tool invocation starts with: the harness's own
    /// config prefix, then the connection flags.
    pub fn tool_args(&self, config_prefix: &str, preferred_serial_port: &str) -> Vec<String> {
        let mut args = vec!["--config".to_string(), config_prefix.to_string()];
        match &self.connection_args {
            Some(connection) => args.extend(connection.iter().cloned()),
            None => args.extend(["--serial".to_string(), preferred_serial_port.to_string()]),
        }
        args
    }

    /// The configured binary, or `meshprobe` in the harness's own directory.
    pub fn binary_path(&self) -> Result<PathBuf> {
        let path = match &self.binary {
            Some(path) => path.clone(),
            None => {
                let exe = std::env::current_exe()?;
                let dir = exe
                    .parent()
                    .ok_or_else(|| HarnessError::BinaryNotFound(exe.clone()))?;
                dir.join(format!("{TOOL_BINARY}{}", std::env::consts::EXE_SUFFIX))
            }
        };

        if path.is_file() {
            Ok(path)
        } else {
            Err(HarnessError::BinaryNotFound(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert!(config.binary.is_none());
        assert_eq!(config.monitor_seconds, 10);
    }

    #[test]
    fn test_tool_args_default_to_preferred_serial_port() {
        let config = HarnessConfig::default();
        assert_eq!(
            config.tool_args("lab", "/dev/ttyUSB0"),
            vec!["--config", "lab", "--serial", "/dev/ttyUSB0"]
        );
    }

    #[test]
    fn test_tool_args_use_configured_connection() {
        let tcp = HarnessConfig {
            connection_args: Some(vec!["--host".to_string(), "192.168.1.20".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            tcp.tool_args("meshprobe", "/dev/ttyUSB0"),
            vec!["--config", "meshprobe", "--host", "192.168.1.20"]
        );

        let auto = HarnessConfig {
            connection_args: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(auto.tool_args("lab", "/dev/ttyUSB0"), vec!["--config", "lab"]);
    }

    #[test]
    fn test_explicit_binary_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("meshprobe");

        let config = HarnessConfig {
            binary: Some(binary.clone()),
            ..Default::default()
        };
        assert!(matches!(
            config.binary_path(),
            Err(HarnessError::BinaryNotFound(p)) if p == binary
        ));

        std::fs::write(&binary, b"").unwrap();
        assert_eq!(config.binary_path().unwrap(), binary);
    }

    #[test]
    fn test_section_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("meshprobe");
        std::fs::write(
            dir.path().join("meshprobe.toml"),
            "[harness]\nbinary = \"/opt/meshprobe/bin/meshprobe\"\nmonitor_seconds = 20\nconnection_args = [\"--host\", \"radio.lan\"]\n",
        )
        .unwrap();

        let config: HarnessConfig =
            meshprobe_core::config::load_section(prefix.to_str().unwrap(), "harness").unwrap();
        assert_eq!(config.monitor_seconds, 20);
        assert_eq!(
            config.connection_args,
            Some(vec!["--host".to_string(), "radio.lan".to_string()])
        );
        assert_eq!(
            config.binary,
            Some(PathBuf::from("/opt/meshprobe/bin/meshprobe"))
        );
    }
}
