//! `meshprobe status`: quick device health check.

use std::process::ExitCode;

use meshprobe_core::types::Destination;

use crate::app::App;
use crate::commands::print_device_info;
use crate::output;

pub async fn run(app: &App, send_test: bool) -> anyhow::Result<ExitCode> {
    let mut session = app.connect().await?;
    let snapshot = session.snapshot();

    println!();
    println!("Device Status:");
    print_device_info(&snapshot);
    println!("Mesh nodes: {} discovered", snapshot.nodes.len());
    println!(
        "Primary channel: {}",
        output::channel(snapshot.primary_channel.as_ref())
    );

    if send_test {
        println!();
        println!("Sending test message: {}", app.device.test_message);
        // A failed test broadcast is reported, not fatal.
        match session.send(&app.device.test_message, Destination::Broadcast).await {
            Ok(_) => println!("Test message sent to mesh!"),
            Err(e) => println!("Message send error: {e}"),
        }
    }

    println!();
    println!("WiFi Status Check:");
    match snapshot.wifi_enabled {
        Some(true) => println!("WiFi configuration found (enabled)"),
        Some(false) => println!("WiFi configuration found (disabled)"),
        None => println!("WiFi config not reported by the device"),
    }

    session.close().await?;
    Ok(ExitCode::SUCCESS)
}
