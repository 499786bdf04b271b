//! `meshprobe send <text> [--dest ID]`

use std::process::ExitCode;

use meshprobe_core::types::{Destination, NodeNum};

use crate::app::App;

pub async fn run(app: &App, text: &str, dest: Option<NodeNum>) -> anyhow::Result<ExitCode> {
    let destination = dest.map(Destination::Node).unwrap_or_default();
    let mut session = app.connect().await?;

    println!("Sending to {destination}: {text}");
    session.send(text, destination).await?;
    println!("Message sent successfully");

    session.close().await?;
    Ok(ExitCode::SUCCESS)
}
