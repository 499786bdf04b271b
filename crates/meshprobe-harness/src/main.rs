//! CLI entry point for the meshprobe test harness.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use meshprobe_core::config::{self, DEFAULT_FILE_PREFIX};
use meshprobe_harness::cases::{default_cases, FIRMWARE_CASE, STATUS_CASE};
use meshprobe_harness::report::{render_case, render_summary};
use meshprobe_harness::runner::{run_case, Outcome};
use meshprobe_harness::{DeviceStatus, HarnessConfig, RunRecorder};
use meshprobe_radio::DeviceConfig;

#[derive(Parser)]
#[command(name = "meshprobe-harness")]
#[command(about = "Run every meshprobe tool against a connected device and report which work")]
struct Cli {
    /// Path to the meshprobe binary (overrides config).
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Print the summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Config file prefix (default: meshprobe).
    #[arg(short, long, default_value = DEFAULT_FILE_PREFIX)]
    config: String,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Harness could not start");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::build(&cli.config)?;
    let mut harness: HarnessConfig = config::from_config(&cfg, "harness")?;
    let device: DeviceConfig = config::from_config(&cfg, "device")?;
    if cli.binary.is_some() {
        harness.binary = cli.binary;
    }
    let binary = harness.binary_path()?;
    let binary_display = binary.display().to_string();
    let global = harness.tool_args(&cli.config, &device.preferred_serial_port);
    let human = !cli.json;

    if human {
        println!("MESHPROBE TOOLS COMPREHENSIVE TEST");
        println!("{}", "=".repeat(60));
        println!("Testing every tool with the connected device...");
        println!("Binary: {binary_display}");
    }

    let mut recorder = RunRecorder::new(&binary_display);

    for case in default_cases(harness.monitor_seconds, Local::now(), &global) {
        if human {
            println!();
            println!("Testing: {}", case.name);
            println!("$ {}", case.command_line("meshprobe"));
            println!("{}", "=".repeat(50));
        }

        let report = run_case(&binary, &case).await;

        if case.name == STATUS_CASE {
            if let Outcome::Success { stdout, .. } = &report.outcome {
                recorder.set_device_status(DeviceStatus::parse(stdout));
            }
        }
        if human {
            print!("{}", render_case(&report));
        }
        recorder.record(report);
    }

    if human {
        println!();
        println!("Testing: {FIRMWARE_CASE} (validation only)");
        println!("{}", "=".repeat(50));
        println!("Skipping actual firmware flash for safety");
    }
    recorder.record_skipped(FIRMWARE_CASE, "firmware flashing is never automated");

    let summary = recorder.finalize();
    if human {
        print!("{}", render_summary(&summary));
    } else {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
