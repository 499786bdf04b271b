//! meshprobe-discover: Local network discovery of mesh radio devices.
//!
//! Widens the host's own address to a /24, probes a bounded candidate set
//! for the device API port and the web interface, and reports which
//! addresses answered.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod probe;
pub mod range;
pub mod scanner;

pub use config::ScanConfig;
pub use probe::Prober;
pub use range::AddressRange;
pub use scanner::{NetworkScanner, ProbeMode, ScanReport};
