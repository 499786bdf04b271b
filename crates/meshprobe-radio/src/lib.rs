//! meshprobe-radio: access to a single mesh radio device.
//!
//! The device-communication library sits behind the [`MeshLink`] trait.
//! Everything above it (connection resolution, sessions, the node database)
//! works on the domain types from `meshprobe-core`.

pub mod config;
pub mod device;
pub mod error;
pub mod link;
pub mod nodes;
pub mod resolve;
pub mod serial;
pub mod session;

pub use config::{DeviceConfig, StrategyKind};
pub use error::{RadioError, Result};
pub use link::MeshLink;
pub use resolve::{resolve, Backend, Connection, Strategy, SystemBackend};
pub use session::{Session, Shutdown};
