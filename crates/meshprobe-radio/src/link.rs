//! The seam between meshprobe and the device-communication library.

use async_trait::async_trait;
use meshprobe_core::events::RadioEvent;
use meshprobe_core::types::{Destination, DeviceSnapshot};

use crate::error::Result;

/// An open connection to one device.
///
/// Implementations have already completed the config handshake, so
/// [`snapshot`](MeshLink::snapshot) is meaningful immediately.
#[async_trait]
pub trait MeshLink: Send {
    /// Current view of the device and its node database.
    fn snapshot(&self) -> DeviceSnapshot;

    /// Wait for the next event. `None` once the device connection is gone.
    async fn next_event(&mut self) -> Option<RadioEvent>;

    async fn send_text(&mut self, text: &str, destination: Destination) -> Result<()>;

    /// Release the connection. Calling it twice is harmless.
    async fn close(&mut self) -> Result<()>;
}
