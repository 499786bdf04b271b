//! A session with one connected device.
//!
//! The session owns the link, counts what it sent, and stops delivering
//! events once its [`Shutdown`] handle fires. Interactive and monitoring
//! commands share the same handle, so Ctrl-C ends any of them cleanly.

use std::sync::Arc;
use std::time::Duration;

use meshprobe_core::events::RadioEvent;
use meshprobe_core::types::{ConnectedVia, Destination, DeviceSnapshot};
use tokio::sync::watch;

use crate::error::{RadioError, Result};
use crate::link::MeshLink;
use crate::resolve::Connection;

/// Cooperative stop signal shared between a session and whoever ends it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire on the first Ctrl-C.
    pub fn on_ctrl_c() -> Self {
        let shutdown = Self::new();
        let handle = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Interrupt received");
                handle.trigger();
            }
        });
        shutdown
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal has fired.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Session {
    link: Box<dyn MeshLink>,
    via: ConnectedVia,
    shutdown: Shutdown,
    sent: u32,
}

impl Session {
    pub fn new(connection: Connection, shutdown: Shutdown) -> Self {
        Self {
            link: connection.link,
            via: connection.via,
            shutdown,
            sent: 0,
        }
    }

    pub fn via(&self) -> &ConnectedVia {
        &self.via
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        self.link.snapshot()
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Messages sent successfully in this session.
    pub fn sent_count(&self) -> u32 {
        self.sent
    }

    /// Send a text message. Returns its sequence number within the session.
    pub async fn send(&mut self, text: &str, destination: Destination) -> Result<u32> {
        if text.trim().is_empty() {
            return Err(RadioError::Send("message is empty".to_string()));
        }
        self.link.send_text(text, destination).await?;
        self.sent += 1;
        tracing::info!(to = %destination, count = self.sent, "Message sent");
        Ok(self.sent)
    }

    /// The next event, or `None` once the link closes or shutdown fires.
    pub async fn next_event(&mut self) -> Option<RadioEvent> {
        if self.shutdown.is_triggered() {
            return None;
        }
        tokio::select! {
            _ = self.shutdown.wait() => None,
            event = self.link.next_event() => event,
        }
    }

    /// Deliver events to `on_event` until `duration` passes (forever when
    /// `None`), shutdown fires, or the link closes. Returns how many text
    /// messages were seen.
    pub async fn monitor<F>(&mut self, duration: Option<Duration>, mut on_event: F) -> usize
    where
        F: FnMut(&RadioEvent),
    {
        let deadline = async {
            match duration {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut messages = 0;
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = self.next_event() => match event {
                    Some(event) => {
                        if event.as_text().is_some() {
                            messages += 1;
                        }
                        on_event(&event);
                    }
                    None => break,
                },
            }
        }

        tracing::debug!(messages, "Monitoring finished");
        messages
    }

    pub async fn close(mut self) -> Result<()> {
        self.link.close().await
    }
}
