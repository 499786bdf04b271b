//! In-memory node database built from the device's config burst and the
//! node updates that follow it.

use std::collections::BTreeMap;

use meshprobe_core::types::{ChannelSummary, DeviceSnapshot, NodeNum, NodeSummary};

/// One piece of device state, already decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeUpdate {
    /// The connected node's own number.
    MyNode(NodeNum),
    /// A node database entry.
    Node(NodeSummary),
    /// The primary channel's settings.
    PrimaryChannel(ChannelSummary),
    /// Whether the device has WiFi enabled.
    Wifi(bool),
}

#[derive(Debug, Clone, Default)]
pub struct NodeDb {
    my_node: Option<NodeNum>,
    nodes: BTreeMap<NodeNum, NodeSummary>,
    primary_channel: Option<ChannelSummary>,
    wifi_enabled: Option<bool>,
}

impl NodeDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `update` into the database. Returns the merged node for node updates.
    pub fn apply(&mut self, update: NodeUpdate) -> Option<NodeSummary> {
        match update {
            NodeUpdate::MyNode(num) => {
                self.my_node = Some(num);
                None
            }
            NodeUpdate::Node(node) => {
                let merged = match self.nodes.remove(&node.num) {
                    Some(existing) => merge(existing, node),
                    None => node,
                };
                self.nodes.insert(merged.num, merged.clone());
                Some(merged)
            }
            NodeUpdate::PrimaryChannel(channel) => {
                self.primary_channel = Some(channel);
                None
            }
            NodeUpdate::Wifi(enabled) => {
                self.wifi_enabled = Some(enabled);
                None
            }
        }
    }

    pub fn my_node(&self) -> Option<NodeNum> {
        self.my_node
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, num: NodeNum) -> Option<&NodeSummary> {
        self.nodes.get(&num)
    }

    /// Current state with nodes ordered by node number.
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            my_node: self.my_node,
            nodes: self.nodes.values().cloned().collect(),
            primary_channel: self.primary_channel.clone(),
            wifi_enabled: self.wifi_enabled,
        }
    }
}

/// Newer values win; fields the update leaves empty keep what we had.
fn merge(existing: NodeSummary, update: NodeSummary) -> NodeSummary {
    NodeSummary {
        num: update.num,
        user_id: update.user_id.or(existing.user_id),
        long_name: update.long_name.or(existing.long_name),
        short_name: update.short_name.or(existing.short_name),
        hw_model: update.hw_model.or(existing.hw_model),
        last_heard: update.last_heard.or(existing.last_heard),
        snr: update.snr.or(existing.snr),
        metrics: update.metrics.or(existing.metrics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use meshprobe_core::types::DeviceMetrics;

    fn named(num: u32, long_name: &str) -> NodeSummary {
        NodeSummary {
            long_name: Some(long_name.to_string()),
            ..NodeSummary::new(NodeNum(num))
        }
    }

    #[test]
    fn test_apply_builds_snapshot() {
        let mut db = NodeDb::new();
        assert!(db.apply(NodeUpdate::MyNode(NodeNum(7))).is_none());
        db.apply(NodeUpdate::Node(named(9, "Relay")));
        db.apply(NodeUpdate::Node(named(7, "Base")));
        db.apply(NodeUpdate::PrimaryChannel(ChannelSummary {
            index: 0,
            name: "LongFast".to_string(),
            encrypted: true,
        }));
        db.apply(NodeUpdate::Wifi(false));

        let snapshot = db.snapshot();
        assert_eq!(snapshot.my_node, Some(NodeNum(7)));
        assert_eq!(
            snapshot.nodes.iter().map(|n| n.num.0).collect::<Vec<_>>(),
            vec![7, 9]
        );
        assert_eq!(snapshot.my_info().unwrap().display_name(), "Base");
        assert_eq!(snapshot.primary_channel.unwrap().name, "LongFast");
        assert_eq!(snapshot.wifi_enabled, Some(false));
    }

    #[test]
    fn test_update_merges_with_existing_entry() {
        let mut db = NodeDb::new();
        let mut first = named(3, "Hilltop");
        first.hw_model = Some("HELTEC_V2_1".to_string());
        db.apply(NodeUpdate::Node(first));

        let mut update = NodeSummary::new(NodeNum(3));
        update.snr = Some(6.25);
        update.last_heard = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        update.metrics = Some(DeviceMetrics {
            battery_level: Some(88),
            ..Default::default()
        });

        let merged = db.apply(NodeUpdate::Node(update)).unwrap();
        assert_eq!(merged.display_name(), "Hilltop");
        assert_eq!(merged.hw_model.as_deref(), Some("HELTEC_V2_1"));
        assert_eq!(merged.snr, Some(6.25));
        assert_eq!(merged.metrics.unwrap().battery_level, Some(88));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_empty_db() {
        let db = NodeDb::new();
        assert!(db.is_empty());
        assert!(db.my_node().is_none());
        let snapshot = db.snapshot();
        assert!(snapshot.nodes.is_empty());
        assert!(snapshot.my_info().is_none());
    }
}
