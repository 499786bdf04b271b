//! Console formatting shared by the subcommands.

use chrono::{DateTime, Local, Utc};
use std::net::IpAddr;

use meshprobe_core::types::{ChannelSummary, DeviceMetrics, NodeSummary, ProbeResult, TextMessage};
use meshprobe_discover::probe::web_url;
use meshprobe_discover::ScanConfig;

pub const UNKNOWN: &str = "Unknown";

/// Wall-clock time in the local zone, `HH:MM:SS`.
pub fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// `[HH:MM:SS] From !1a2b3c4d: text`
pub fn message_line(msg: &TextMessage) -> String {
    format!("[{}] From {}: {}", clock(msg.received_at), msg.from, msg.text)
}

/// How long ago `then` was, relative to `now`.
pub fn age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

pub fn last_heard(node: &NodeSummary, now: DateTime<Utc>) -> String {
    node.last_heard
        .map(|t| age(t, now))
        .unwrap_or_else(|| "never".to_string())
}

/// `  - Hilltop Relay (ID: !00000009), last heard 5m ago`
pub fn node_line(node: &NodeSummary, now: DateTime<Utc>) -> String {
    format!(
        "  - {} (ID: {}), last heard {}",
        node.display_name(),
        node.id_string(),
        last_heard(node, now)
    )
}

pub fn battery(metrics: Option<&DeviceMetrics>) -> String {
    metrics
        .and_then(|m| m.battery_level)
        .map(|level| format!("{level}%"))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn voltage(metrics: Option<&DeviceMetrics>) -> String {
    metrics
        .and_then(|m| m.voltage)
        .map(|v| format!("{v:.2}V"))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn percent(value: Option<f32>) -> String {
    value
        .map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn channel(channel: Option<&ChannelSummary>) -> String {
    match channel {
        Some(ch) => format!(
            "{} (index {}, encryption {})",
            ch.name,
            ch.index,
            if ch.encrypted { "enabled" } else { "disabled" }
        ),
        None => UNKNOWN.to_string(),
    }
}

/// Web interface URL on the configured HTTP port.
pub fn http_url(address: IpAddr, scan: &ScanConfig) -> String {
    web_url("http", address, scan.http_port, 80)
}

pub fn https_url(address: IpAddr, scan: &ScanConfig) -> String {
    web_url("https", address, scan.https_port, 443)
}

/// One line per service that answered at `result.address`.
pub fn service_lines(result: &ProbeResult, scan: &ScanConfig) -> Vec<String> {
    let mut lines = Vec::new();
    if result.http {
        lines.push(format!("Web interface: {}", http_url(result.address, scan)));
    }
    if result.https {
        lines.push(format!("HTTPS interface: {}", https_url(result.address, scan)));
    }
    if result.api {
        lines.push(format!("API port {} open", scan.api_port));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use meshprobe_core::types::NodeNum;
    use std::net::Ipv4Addr;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_message_line() {
        let received_at = at(0);
        let msg = TextMessage {
            from: NodeNum(0x1a2b3c4d),
            to: NodeNum::BROADCAST,
            channel: 0,
            text: "hello mesh".to_string(),
            received_at,
        };
        assert_eq!(
            message_line(&msg),
            format!("[{}] From !1a2b3c4d: hello mesh", clock(received_at))
        );
        assert_eq!(clock(received_at).len(), 8);
    }

    #[test]
    fn test_age_buckets() {
        let now = at(0);
        assert_eq!(age(now - Duration::seconds(12), now), "just now");
        assert_eq!(age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(age(now - Duration::hours(3), now), "3h ago");
        assert_eq!(age(now - Duration::days(2), now), "2d ago");
        // Clock skew: a timestamp from the future is "just now".
        assert_eq!(age(now + Duration::minutes(1), now), "just now");
    }

    #[test]
    fn test_node_line() {
        let now = at(600);
        let mut node = NodeSummary::new(NodeNum(9));
        assert_eq!(node_line(&node, now), "  - Unknown (ID: !00000009), last heard never");

        node.long_name = Some("Hilltop Relay".to_string());
        node.user_id = Some("!00000009".to_string());
        node.last_heard = Some(at(300));
        assert_eq!(
            node_line(&node, now),
            "  - Hilltop Relay (ID: !00000009), last heard 5m ago"
        );
    }

    #[test]
    fn test_metric_formatting() {
        let metrics = DeviceMetrics {
            battery_level: Some(87),
            voltage: Some(4.1),
            ..Default::default()
        };
        assert_eq!(battery(Some(&metrics)), "87%");
        assert_eq!(voltage(Some(&metrics)), "4.10V");
        assert_eq!(battery(None), UNKNOWN);
        assert_eq!(voltage(Some(&DeviceMetrics::default())), UNKNOWN);
        assert_eq!(percent(Some(3.26)), "3.3%");
        assert_eq!(percent(None), UNKNOWN);
    }

    #[test]
    fn test_channel_formatting() {
        let ch = ChannelSummary {
            index: 0,
            name: "LongFast".to_string(),
            encrypted: true,
        };
        assert_eq!(channel(Some(&ch)), "LongFast (index 0, encryption enabled)");
        assert_eq!(channel(None), UNKNOWN);
    }

    #[test]
    fn test_service_lines() {
        let scan = ScanConfig::default();
        let mut result = ProbeResult::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)));
        assert!(service_lines(&result, &scan).is_empty());

        result.api = true;
        result.http = true;
        assert_eq!(
            service_lines(&result, &scan),
            vec![
                "Web interface: http://192.168.1.20".to_string(),
                "API port 4403 open".to_string(),
            ]
        );
    }

    #[test]
    fn test_service_lines_use_configured_ports() {
        let scan = ScanConfig {
            api_port: 14403,
            http_port: 8080,
            https_port: 8443,
            ..Default::default()
        };
        let mut result = ProbeResult::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)));
        result.api = true;
        result.http = true;
        result.https = true;
        assert_eq!(
            service_lines(&result, &scan),
            vec![
                "Web interface: http://10.0.0.7:8080".to_string(),
                "HTTPS interface: https://10.0.0.7:8443".to_string(),
                "API port 14403 open".to_string(),
            ]
        );
    }
}
