//! `meshprobe nodes`

use std::process::ExitCode;

use crate::app::App;
use crate::commands::print_nodes;

pub async fn run(app: &App) -> anyhow::Result<ExitCode> {
    let session = app.connect().await?;
    let snapshot = session.snapshot();

    if let Some(me) = snapshot.my_info() {
        println!("My Node: {} ({})", me.display_name(), me.id_string());
    }
    print_nodes(&snapshot);

    session.close().await?;
    println!("Scan completed successfully");
    Ok(ExitCode::SUCCESS)
}
