//! meshprobe-harness: runs each `meshprobe` tool as a child process against a
//! connected device and reports which ones work.

pub mod cases;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod status;

pub use cases::ToolCase;
pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use report::{RunRecorder, RunSummary, Verdict};
pub use runner::{CaseReport, Outcome};
pub use status::{DeviceStatus, NetworkHealth};
