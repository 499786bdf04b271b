//! `meshprobe listen` and `meshprobe monitor`.

use std::process::ExitCode;
use std::time::Duration;

use meshprobe_core::events::RadioEvent;

use crate::app::App;
use crate::output;

pub async fn run_listen(app: &App) -> anyhow::Result<ExitCode> {
    let mut session = app.connect().await?;
    println!("Listening for messages... (Ctrl+C to stop)");

    let messages = session.monitor(None, print_event).await;

    println!("Stopped. Received {messages} message(s)");
    session.close().await?;
    Ok(ExitCode::SUCCESS)
}

pub async fn run_monitor(app: &App, seconds: u64) -> anyhow::Result<ExitCode> {
    let mut session = app.connect().await?;
    println!("Monitoring for incoming messages ({seconds} seconds)...");

    let messages = session
        .monitor(Some(Duration::from_secs(seconds)), print_event)
        .await;

    println!("Monitoring completed. Received {messages} message(s)");
    session.close().await?;
    Ok(ExitCode::SUCCESS)
}

fn print_event(event: &RadioEvent) {
    match event {
        RadioEvent::Text(msg) => println!("{}", output::message_line(msg)),
        RadioEvent::NodeUpdated(node) => {
            tracing::debug!(node = %node.num, name = node.display_name(), "Node updated");
        }
        RadioEvent::Packet { from, port } => {
            tracing::debug!(from = %from, port, "Packet received");
        }
    }
}
