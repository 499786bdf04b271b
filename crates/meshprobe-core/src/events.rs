//! Events delivered by a connected radio.
//!
//! The device library hands back a stream of raw packets; the radio crate
//! narrows them to these three cases before anything else sees them.

use serde::{Deserialize, Serialize};

use crate::types::{NodeNum, NodeSummary, TextMessage};

/// Something the connected device reported after the config handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RadioEvent {
    /// A text message addressed to us or broadcast on a channel we listen to.
    Text(TextMessage),
    /// The node database learned something new about a node.
    NodeUpdated(NodeSummary),
    /// Any other mesh packet (telemetry, position, routing, ...).
    Packet { from: NodeNum, port: i32 },
}

impl RadioEvent {
    pub fn as_text(&self) -> Option<&TextMessage> {
        match self {
            Self::Text(msg) => Some(msg),
            _ => None,
        }
    }
}
