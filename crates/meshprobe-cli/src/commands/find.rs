//! `meshprobe find`: locate the device on the local network.

use std::net::SocketAddr;
use std::process::ExitCode;

use meshprobe_discover::connectivity::{check_internet, resolve_host, INTERNET_TIMEOUT};
use meshprobe_discover::{AddressRange, NetworkScanner, ScanConfig};

use crate::app::App;
use crate::commands::probe::check_specific;
use crate::output;

pub async fn run(app: &App) -> anyhow::Result<ExitCode> {
    println!("meshprobe network scanner");
    println!("{}", "=".repeat(40));

    println!("Checking network connectivity...");
    if check_internet(INTERNET_TIMEOUT).await {
        println!("Internet connectivity: OK");
    } else {
        println!("No internet connectivity");
    }

    let range = AddressRange::detect().await;
    match &range {
        Ok(range) => {
            println!("Local network: {}", range.network());
            println!("Your IP: {}", range.local());
        }
        Err(e) => println!("Cannot determine local network: {e}"),
    }
    println!();

    let scanner = NetworkScanner::new(&app.scan)?;

    println!("Trying common hostnames...");
    let mut found_by_hostname = false;
    for host in &app.device.hostnames {
        match resolve_host(host, app.device.resolve_timeout()).await {
            Some(address) => {
                println!("Resolved {host} to {address}");
                if check_specific(&scanner, address, &app.scan).await {
                    found_by_hostname = true;
                    break;
                }
            }
            None => println!("Cannot resolve {host}"),
        }
    }

    if !found_by_hostname {
        println!();
        println!("Hostname lookup failed, scanning network...");
        match range {
            Ok(range) => scan(&scanner, &range, &app.scan).await,
            Err(_) => println!("Skipping scan: no local network"),
        }
    }

    print_next_steps();
    Ok(ExitCode::SUCCESS)
}

async fn scan(scanner: &NetworkScanner, range: &AddressRange, config: &ScanConfig) {
    println!("Scanning network: {} (your IP: {})", range.network(), range.local());

    let report = scanner
        .scan(range, |hit| {
            println!("Found device at {}", hit.address);
            for line in output::service_lines(hit, config) {
                println!("   {line}");
            }
        })
        .await;

    if report.hits.is_empty() {
        println!();
        println!("No Meshtastic devices found on network");
        println!("Possible reasons:");
        println!("   - Device not connected to WiFi yet");
        println!("   - Device on a different network or VLAN");
        println!("   - WiFi credentials incorrect");
        println!("   - Device still booting up");
        return;
    }

    println!();
    println!(
        "Found {} Meshtastic device(s) among {} addresses in {:.1}s!",
        report.hits.len(),
        report.probed,
        report.duration.as_secs_f64()
    );
    for hit in &report.hits {
        println!();
        println!("Device: {}", hit.address);
        if hit.http {
            println!("   Open {} in your browser", output::http_url(hit.address, config));
        }
        if hit.api {
            println!("   API: {}", SocketAddr::new(hit.address, config.api_port));
        }
    }
}

fn print_next_steps() {
    println!();
    println!("Manual check:");
    println!("   1. Connect via serial: meshprobe --serial <port> status");
    println!("   2. Check the device IP in its network settings");
    println!("   3. Try http://<device-ip> in a browser");
    println!();
    println!("Next steps:");
    println!("   - If a device was found: meshprobe --host <device-ip> chat");
    println!("   - If not: check the serial connection with meshprobe status");
}
