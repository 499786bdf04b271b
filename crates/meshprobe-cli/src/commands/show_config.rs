//! `meshprobe config`: identity, hardware and channel.

use std::process::ExitCode;

use crate::app::App;
use crate::output;

pub async fn run(app: &App) -> anyhow::Result<ExitCode> {
    let session = app.connect().await?;
    let snapshot = session.snapshot();
    let me = snapshot.my_info();

    println!("DEVICE CONFIGURATION:");
    println!(
        "  Node ID: {}",
        me.map(|n| n.id_string())
            .or_else(|| snapshot.my_node.map(|n| n.to_string()))
            .unwrap_or_else(|| output::UNKNOWN.to_string())
    );
    println!(
        "  Long Name: {}",
        me.and_then(|n| n.long_name.as_deref())
            .unwrap_or(output::UNKNOWN)
    );
    println!(
        "  Hardware: {}",
        me.and_then(|n| n.hw_model.as_deref())
            .unwrap_or(output::UNKNOWN)
    );

    println!("RADIO CONFIGURATION:");
    println!(
        "  Primary channel: {}",
        output::channel(snapshot.primary_channel.as_ref())
    );
    match snapshot.primary_channel.as_ref() {
        Some(ch) => println!(
            "  Encryption: {}",
            if ch.encrypted { "Enabled" } else { "Disabled" }
        ),
        None => println!("  Radio config not available from the device"),
    }

    session.close().await?;
    println!("Configuration retrieval completed");
    Ok(ExitCode::SUCCESS)
}
