//! One module per subcommand.

pub mod chat;
pub mod find;
pub mod listen;
pub mod nodes;
pub mod probe;
pub mod send;
pub mod show_config;
pub mod signal;
pub mod status;

use chrono::Utc;
use meshprobe_core::types::DeviceSnapshot;

use crate::output;

/// Name, id, battery, voltage and uptime of the connected node.
///
/// The labels are stable: the test harness parses them.
pub(crate) fn print_device_info(snapshot: &DeviceSnapshot) {
    let Some(me) = snapshot.my_info() else {
        println!("Node: {} ({})", output::UNKNOWN, output::UNKNOWN);
        return;
    };

    println!("Node: {} ({})", me.display_name(), me.id_string());
    let metrics = me.metrics.as_ref();
    if let Some(level) = metrics.and_then(|m| m.battery_level) {
        println!("Battery: {level}%");
    }
    if metrics.and_then(|m| m.voltage).is_some() {
        println!("Voltage: {}", output::voltage(metrics));
    }
    if let Some(uptime) = metrics.and_then(|m| m.uptime_display()) {
        println!("Uptime: {uptime}");
    }
}

/// Node list with last-heard ages.
pub(crate) fn print_nodes(snapshot: &DeviceSnapshot) {
    let now = Utc::now();
    println!("Mesh Network Nodes: {} discovered", snapshot.nodes.len());
    for node in &snapshot.nodes {
        println!("{}", output::node_line(node, now));
    }
}
