//! The tool invocations the harness runs, in order.

use std::time::Duration;

use chrono::{DateTime, Local};

/// One `meshprobe` invocation with its time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCase {
    pub name: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolCase {
    pub fn new(name: &str, args: &[&str], timeout_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Put `global` flags ahead of the subcommand.
    pub fn with_global_args(mut self, global: &[String]) -> Self {
        self.args.splice(0..0, global.iter().cloned());
        self
    }

    /// The command line as typed, for display.
    pub fn command_line(&self, binary: &str) -> String {
        std::iter::once(binary.to_string())
            .chain(self.args.iter().map(|a| {
                if a.contains(' ') {
                    format!("\"{a}\"")
                } else {
                    a.clone()
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Name of the case whose output is parsed into a device status.
pub const STATUS_CASE: &str = "check_device_status";

/// Name of the step that is reported but never executed.
pub const FIRMWARE_CASE: &str = "build_and_flash_firmware";

/// The standard run. `now` stamps the test message so repeated runs are
/// distinguishable on the mesh; `global` flags go on every invocation.
pub fn default_cases(monitor_seconds: u64, now: DateTime<Local>, global: &[String]) -> Vec<ToolCase> {
    let message = format!("test message at {}", now.format("%H:%M:%S"));
    let monitor = monitor_seconds.to_string();

    vec![
        ToolCase::new(STATUS_CASE, &["status"], 10),
        ToolCase::new("scan_mesh_network", &["nodes"], 15),
        ToolCase::new("send_mesh_message", &["send", &message], 10),
        ToolCase::new("get_signal_quality", &["signal"], 10),
        ToolCase::new("scan_wifi_network", &["find"], 20),
        ToolCase::new("get_device_config", &["config"], 10),
        ToolCase::new(
            "monitor_mesh_messages",
            &["monitor", "--seconds", &monitor],
            monitor_seconds + 5,
        ),
    ]
    .into_iter()
    .map(|case| case.with_global_args(global))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_cases() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 14, 3, 9).unwrap();
        let cases = default_cases(10, now, &[]);

        let names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                STATUS_CASE,
                "scan_mesh_network",
                "send_mesh_message",
                "get_signal_quality",
                "scan_wifi_network",
                "get_device_config",
                "monitor_mesh_messages",
            ]
        );

        assert_eq!(cases[2].args, vec!["send", "test message at 14:03:09"]);
        assert_eq!(cases[4].timeout, Duration::from_secs(20));
        assert_eq!(cases[6].args, vec!["monitor", "--seconds", "10"]);
        assert_eq!(cases[6].timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_every_case_carries_global_args() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 14, 3, 9).unwrap();
        let global: Vec<String> = ["--config", "lab", "--serial", "/dev/ttyUSB0"]
            .iter()
            .map(|a| a.to_string())
            .collect();
        let cases = default_cases(10, now, &global);

        for case in &cases {
            assert_eq!(&case.args[..4], &global[..], "{}", case.name);
        }
        assert_eq!(
            cases[0].args,
            vec!["--config", "lab", "--serial", "/dev/ttyUSB0", "status"]
        );
        assert_eq!(
            cases[2].args[4..],
            ["send".to_string(), "test message at 14:03:09".to_string()]
        );
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let case = ToolCase::new("send", &["send", "hello mesh"], 10);
        assert_eq!(case.command_line("meshprobe"), "meshprobe send \"hello mesh\"");
    }
}
