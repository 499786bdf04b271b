//! CLI entry point for meshprobe.

mod app;
mod commands;
mod output;

use std::net::IpAddr;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use meshprobe_core::config::DEFAULT_FILE_PREFIX;
use meshprobe_core::types::NodeNum;

use crate::app::App;

#[derive(Parser)]
#[command(name = "meshprobe")]
#[command(about = "Find, probe and talk to a Meshtastic radio over USB serial or WiFi", version)]
struct Cli {
    /// Connect over this serial port only.
    #[arg(long, global = true, conflicts_with = "host")]
    serial: Option<String>,

    /// Connect to this TCP host only.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Config file prefix (default: meshprobe).
    #[arg(short, long, global = true, default_value = DEFAULT_FILE_PREFIX)]
    config: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look for the device on the local network.
    Find,
    /// Check which device services answer at one address.
    Probe { address: IpAddr },
    /// Interactive messaging.
    Chat,
    /// Print incoming messages until interrupted.
    Listen,
    /// Print incoming messages for a fixed time.
    Monitor {
        /// How long to listen.
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(5..=300))]
        seconds: u64,
    },
    /// Device status, mesh size, channel and WiFi check.
    Status {
        /// Skip the test broadcast.
        #[arg(long)]
        no_send: bool,
    },
    /// List the nodes in the device's database.
    Nodes,
    /// Send one text message.
    Send {
        text: String,
        /// Destination node (`!1a2b3c4d`, `0x1a2b3c4d` or decimal). Broadcast when omitted.
        #[arg(long)]
        dest: Option<NodeNum>,
    },
    /// Battery, air utilization and per-node SNR.
    Signal,
    /// Node identity, hardware and channel configuration.
    Config,
}

impl Command {
    /// Commands that stream events until stopped. Only these take over
    /// Ctrl-C to close the session cleanly.
    fn streams_events(&self) -> bool {
        matches!(self, Self::Chat | Self::Listen | Self::Monitor { .. })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let app = App::load(
        &cli.config,
        cli.serial,
        cli.host,
        cli.command.streams_events(),
    )?;

    match cli.command {
        Command::Find => commands::find::run(&app).await,
        Command::Probe { address } => commands::probe::run(&app, address).await,
        Command::Chat => commands::chat::run(&app).await,
        Command::Listen => commands::listen::run_listen(&app).await,
        Command::Monitor { seconds } => commands::listen::run_monitor(&app, seconds).await,
        Command::Status { no_send } => commands::status::run(&app, !no_send).await,
        Command::Nodes => commands::nodes::run(&app).await,
        Command::Send { text, dest } => commands::send::run(&app, &text, dest).await,
        Command::Signal => commands::signal::run(&app).await,
        Command::Config => commands::show_config::run(&app).await,
    }
}
