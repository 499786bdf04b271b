//! `meshprobe signal`: battery, air time and per-node SNR.

use std::process::ExitCode;

use crate::app::App;
use crate::output;

pub async fn run(app: &App) -> anyhow::Result<ExitCode> {
    let session = app.connect().await?;
    let snapshot = session.snapshot();

    let metrics = snapshot.my_info().and_then(|me| me.metrics.as_ref());
    println!("Battery Level: {}", output::battery(metrics));
    println!("Voltage: {}", output::voltage(metrics));
    println!(
        "Channel utilization: {}",
        output::percent(metrics.and_then(|m| m.channel_utilization))
    );
    println!(
        "Air utilization TX: {}",
        output::percent(metrics.and_then(|m| m.air_util_tx))
    );

    println!("Network Nodes: {} reachable", snapshot.nodes.len());
    for node in snapshot.nodes.iter().filter(|n| Some(n.num) != snapshot.my_node) {
        if let Some(snr) = node.snr {
            println!("Node {} ({}): SNR={snr:.2} dB", node.id_string(), node.display_name());
        }
    }

    session.close().await?;
    println!("Signal quality check completed");
    Ok(ExitCode::SUCCESS)
}
