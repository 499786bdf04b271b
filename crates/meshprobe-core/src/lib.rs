//! meshprobe-core: Shared types, configuration, and error handling for meshprobe.
//!
//! This crate provides the foundational types used across all meshprobe components:
//! - Mesh node identities, node summaries and device metrics
//! - Network probe results and connection tags
//! - Radio events delivered by a connected device
//! - Layered configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::MeshprobeError;
pub use types::{
    ChannelSummary, ConnectedVia, Destination, DeviceMetrics, DeviceSnapshot, NodeNum,
    NodeSummary, ProbeResult, TextMessage,
};
