//! `meshprobe probe <ip>`: check one address.

use std::net::IpAddr;
use std::process::ExitCode;

use meshprobe_discover::{NetworkScanner, ScanConfig};

use crate::app::App;
use crate::output;

pub async fn run(app: &App, address: IpAddr) -> anyhow::Result<ExitCode> {
    let scanner = NetworkScanner::new(&app.scan)?;
    if check_specific(&scanner, address, &app.scan).await {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Probe `address` and print what answered. True when anything did.
pub(crate) async fn check_specific(scanner: &NetworkScanner, address: IpAddr, scan: &ScanConfig) -> bool {
    println!("Checking {address} for Meshtastic services...");

    let Some(result) = scanner.check_address(address).await else {
        println!("No Meshtastic services found at {address}");
        return false;
    };

    println!("Meshtastic device found at {address}!");
    for line in output::service_lines(&result, scan) {
        println!("  {line}");
    }
    if result.http {
        println!("  Device settings and messaging are available from a browser");
    }
    if result.api {
        println!("  Connect with: meshprobe --host {address} chat");
    }
    true
}
