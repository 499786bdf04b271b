//! Loaded configuration and connection setup shared by every subcommand.

use meshprobe_core::config;
use meshprobe_discover::ScanConfig;
use meshprobe_radio::{resolve, DeviceConfig, Session, Shutdown, Strategy, SystemBackend};

pub struct App {
    pub device: DeviceConfig,
    pub scan: ScanConfig,
    strategies: Vec<Strategy>,
    interruptible: bool,
}

impl App {
    /// `interruptible` sessions end cleanly on Ctrl-C; all others leave the
    /// default signal handling alone so Ctrl-C still kills the process.
    pub fn load(
        file_prefix: &str,
        serial: Option<String>,
        host: Option<String>,
        interruptible: bool,
    ) -> anyhow::Result<Self> {
        let cfg = config::build(file_prefix)?;
        let device: DeviceConfig = config::from_config(&cfg, "device")?;
        let scan: ScanConfig = config::from_config(&cfg, "scan")?;
        let strategies = strategies_for(&device, serial, host);

        tracing::debug!(
            strategies = ?strategies,
            api_port = scan.api_port,
            "Configuration loaded"
        );

        Ok(Self {
            device,
            scan,
            strategies,
            interruptible,
        })
    }

    /// Resolve a device and open a session on it.
    pub async fn connect(&self) -> anyhow::Result<Session> {
        println!("Connecting to device...");
        let backend = SystemBackend::new(self.device.clone(), self.scan.clone());
        let connection = resolve(&self.strategies, &backend).await?;
        println!("Connected! ({})", connection.via);
        Ok(Session::new(connection, self.shutdown()))
    }

    fn shutdown(&self) -> Shutdown {
        if self.interruptible {
            Shutdown::on_ctrl_c()
        } else {
            Shutdown::new()
        }
    }
}

/// An explicit `--serial` or `--host` replaces the configured strategy list.
fn strategies_for(device: &DeviceConfig, serial: Option<String>, host: Option<String>) -> Vec<Strategy> {
    match (serial, host) {
        (Some(port), _) => vec![Strategy::Serial(Some(port))],
        (None, Some(host)) => vec![Strategy::Tcp(host)],
        (None, None) => Strategy::from_config(device),
    }
}
