//! [`MeshLink`] over the `meshtastic` crate's stream API.
//!
//! Connecting performs the config handshake and drains the device's config
//! burst into a [`NodeDb`] before returning, so callers get a populated
//! snapshot. Raw packets are narrowed to domain values here and nowhere else.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meshtastic::utils::generate_rand_id;
use meshtastic::utils::stream::{build_serial_stream, build_tcp_stream};
use meshtastic::api::{state, ConnectedStreamApi, StreamApi};
use meshtastic::packet::{PacketDestination, PacketRouter};
use meshtastic::protobufs::{self, from_radio, mesh_packet, FromRadio, MeshPacket, PortNum};
use meshtastic::types::{MeshChannel, NodeId};
use meshprobe_core::events::RadioEvent;
use meshprobe_core::types::{
    ChannelSummary, Destination, DeviceMetrics, DeviceSnapshot, NodeNum, NodeSummary, TextMessage,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{timeout_at, Instant};

use crate::config::DeviceConfig;
use crate::error::{RadioError, Result};
use crate::link::MeshLink;
use crate::nodes::{NodeDb, NodeUpdate};

/// Name shown for the primary channel when the device leaves it blank.
const DEFAULT_CHANNEL_NAME: &str = "Primary";

/// Settings a link needs after the handshake.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub config_timeout: Duration,
    pub channel: u32,
    pub want_ack: bool,
}

impl From<&DeviceConfig> for LinkSettings {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            config_timeout: config.config_timeout(),
            channel: config.channel,
            want_ack: config.want_ack,
        }
    }
}

pub struct MeshtasticLink {
    api: Option<ConnectedStreamApi<state::Configured>>,
    listener: UnboundedReceiver<FromRadio>,
    nodes: NodeDb,
    settings: LinkSettings,
}

impl MeshtasticLink {
    pub async fn connect_serial(port: &str, settings: LinkSettings) -> Result<Self> {
        tracing::debug!(port, "Opening serial connection");
        let stream = build_serial_stream(port.to_string(), None, None, None)
            .map_err(device_error)?;
        let (listener, api) = StreamApi::new().connect(stream).await;

        let config_id = generate_rand_id();
        let api = api.configure(config_id).await.map_err(device_error)?;
        Self::finish_handshake(api, listener, config_id, settings).await
    }

    /// `host` may carry its own port; `port` applies otherwise.
    pub async fn connect_tcp(host: &str, port: u16, settings: LinkSettings) -> Result<Self> {
        let address = tcp_target(host, port)?;
        tracing::debug!(address = %address, "Opening TCP connection");
        let stream = build_tcp_stream(address)
            .await
            .map_err(device_error)?;
        let (listener, api) = StreamApi::new().connect(stream).await;

        let config_id = generate_rand_id();
        let api = api.configure(config_id).await.map_err(device_error)?;
        Self::finish_handshake(api, listener, config_id, settings).await
    }

    /// Drain the config burst until the device echoes `config_id` or the
    /// configured timeout passes. A timeout keeps whatever arrived.
    async fn finish_handshake(
        api: ConnectedStreamApi<state::Configured>,
        mut listener: UnboundedReceiver<FromRadio>,
        config_id: u32,
        settings: LinkSettings,
    ) -> Result<Self> {
        let deadline = Instant::now() + settings.config_timeout;
        let mut nodes = NodeDb::new();

        loop {
            match timeout_at(deadline, listener.recv()).await {
                Ok(Some(packet)) => {
                    if let Some(from_radio::PayloadVariant::ConfigCompleteId(id)) =
                        &packet.payload_variant
                    {
                        if *id == config_id {
                            break;
                        }
                    }
                    if let Incoming::Update(update) = classify(packet) {
                        nodes.apply(update);
                    }
                }
                Ok(None) => {
                    return Err(RadioError::Device(
                        "device closed the connection during configuration".to_string(),
                    ));
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = settings.config_timeout.as_secs(),
                        nodes = nodes.len(),
                        "Device configuration incomplete, continuing with partial state"
                    );
                    break;
                }
            }
        }

        tracing::info!(
            my_node = ?nodes.my_node(),
            nodes = nodes.len(),
            "Device configured"
        );

        Ok(Self {
            api: Some(api),
            listener,
            nodes,
            settings,
        })
    }
}

#[async_trait]
impl MeshLink for MeshtasticLink {
    fn snapshot(&self) -> DeviceSnapshot {
        self.nodes.snapshot()
    }

    async fn next_event(&mut self) -> Option<RadioEvent> {
        loop {
            let packet = self.listener.recv().await?;
            match classify(packet) {
                Incoming::Event(event) => return Some(event),
                Incoming::Update(update) => {
                    if let Some(node) = self.nodes.apply(update) {
                        return Some(RadioEvent::NodeUpdated(node));
                    }
                }
                Incoming::Ignored => {}
            }
        }
    }

    async fn send_text(&mut self, text: &str, destination: Destination) -> Result<()> {
        let api = self.api.as_mut().ok_or(RadioError::NotConnected)?;
        let mut router = LocalRouter {
            node: self.nodes.my_node().unwrap_or(NodeNum(0)),
        };
        let channel =
            MeshChannel::new(self.settings.channel).map_err(|e| RadioError::Send(e.to_string()))?;

        api.send_text(
            &mut router,
            text.to_string(),
            packet_destination(destination),
            self.settings.want_ack,
            channel,
        )
        .await
        .map_err(|e| RadioError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(api) = self.api.take() {
            api.disconnect().await.map_err(device_error)?;
            tracing::debug!("Device connection closed");
        }
        Ok(())
    }
}

/// Router handed to the library on send; we only need it to know our node.
struct LocalRouter {
    node: NodeNum,
}

impl PacketRouter<(), RadioError> for LocalRouter {
    fn handle_packet_from_radio(&mut self, _packet: FromRadio) -> std::result::Result<(), RadioError> {
        Ok(())
    }

    fn handle_mesh_packet(&mut self, _packet: MeshPacket) -> std::result::Result<(), RadioError> {
        Ok(())
    }

    fn source_node_id(&self) -> NodeId {
        NodeId::new(self.node.0)
    }
}

/// Normalize `host`, `host:port`, an IP literal, `[v6]` or `[v6]:port` into a
/// connectable `host:port`.
pub fn tcp_target(host: &str, default_port: u16) -> Result<String> {
    let host = host.trim();
    let invalid = |why: &str| RadioError::Device(format!("invalid TCP host {host:?}: {why}"));

    if host.is_empty() {
        return Err(invalid("empty"));
    }
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port).to_string());
    }
    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Ok(addr.to_string());
    }

    match host.rsplit_once(':') {
        None => Ok(format!("{host}:{default_port}")),
        Some((name, _)) if name.is_empty() || name.contains(':') => {
            Err(invalid("expected host or host:port"))
        }
        Some((name, port)) => {
            let port: u16 = port
                .parse()
                .map_err(|_| invalid("port must be a number from 0 to 65535"))?;
            Ok(format!("{name}:{port}"))
        }
    }
}

fn device_error(e: impl std::fmt::Display) -> RadioError {
    RadioError::Device(e.to_string())
}

fn packet_destination(destination: Destination) -> PacketDestination {
    match destination {
        Destination::Broadcast => PacketDestination::Broadcast,
        Destination::Node(num) => PacketDestination::Node(NodeId::new(num.0)),
    }
}

/// A packet from the device, narrowed to what meshprobe cares about.
#[derive(Debug)]
enum Incoming {
    Update(NodeUpdate),
    Event(RadioEvent),
    Ignored,
}

fn classify(packet: FromRadio) -> Incoming {
    match packet.payload_variant {
        Some(from_radio::PayloadVariant::MyInfo(info)) => {
            Incoming::Update(NodeUpdate::MyNode(NodeNum(info.my_node_num)))
        }
        Some(from_radio::PayloadVariant::NodeInfo(info)) => {
            Incoming::Update(NodeUpdate::Node(node_summary(info)))
        }
        Some(from_radio::PayloadVariant::Channel(channel)) => match primary_channel(channel) {
            Some(summary) => Incoming::Update(NodeUpdate::PrimaryChannel(summary)),
            None => Incoming::Ignored,
        },
        Some(from_radio::PayloadVariant::Config(config)) => match config.payload_variant {
            Some(protobufs::config::PayloadVariant::Network(network)) => {
                Incoming::Update(NodeUpdate::Wifi(network.wifi_enabled))
            }
            _ => Incoming::Ignored,
        },
        Some(from_radio::PayloadVariant::Packet(packet)) => mesh_event(packet),
        _ => Incoming::Ignored,
    }
}

fn mesh_event(packet: MeshPacket) -> Incoming {
    let Some(mesh_packet::PayloadVariant::Decoded(data)) = packet.payload_variant else {
        // Encrypted for a channel we do not hold.
        return Incoming::Ignored;
    };

    if data.portnum == PortNum::TextMessageApp as i32 {
        Incoming::Event(RadioEvent::Text(TextMessage {
            from: NodeNum(packet.from),
            to: NodeNum(packet.to),
            channel: packet.channel,
            text: String::from_utf8_lossy(&data.payload).into_owned(),
            received_at: Utc::now(),
        }))
    } else {
        Incoming::Event(RadioEvent::Packet {
            from: NodeNum(packet.from),
            port: data.portnum,
        })
    }
}

fn primary_channel(channel: protobufs::Channel) -> Option<ChannelSummary> {
    if channel.role != protobufs::channel::Role::Primary as i32 {
        return None;
    }
    let settings = channel.settings.unwrap_or_default();
    let name = if settings.name.is_empty() {
        DEFAULT_CHANNEL_NAME.to_string()
    } else {
        settings.name
    };
    Some(ChannelSummary {
        index: channel.index,
        name,
        encrypted: !settings.psk.is_empty(),
    })
}

fn node_summary(info: protobufs::NodeInfo) -> NodeSummary {
    let mut node = NodeSummary::new(NodeNum(info.num));

    if let Some(user) = info.user {
        node.user_id = non_empty(user.id);
        node.long_name = non_empty(user.long_name);
        node.short_name = non_empty(user.short_name);
        node.hw_model = protobufs::HardwareModel::try_from(user.hw_model)
            .ok()
            .map(|model| model.as_str_name().to_string());
    }

    if info.last_heard > 0 {
        node.last_heard = DateTime::from_timestamp(i64::from(info.last_heard), 0);
    }
    if info.snr != 0.0 {
        node.snr = Some(info.snr);
    }

    node.metrics = info
        .device_metrics
        .map(|m| DeviceMetrics {
            battery_level: m.battery_level.reading(),
            voltage: m.voltage.reading(),
            channel_utilization: m.channel_utilization.reading(),
            air_util_tx: m.air_util_tx.reading(),
            uptime_seconds: m.uptime_seconds.reading(),
        })
        .filter(|m| !m.is_empty());

    node
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// A telemetry field that may be unset. Metric fields are plain or optional
/// depending on the protobuf revision; a plain zero counts as unset.
trait Reading<T> {
    fn reading(self) -> Option<T>;
}

impl<T> Reading<T> for Option<T> {
    fn reading(self) -> Option<T> {
        self
    }
}

impl Reading<u32> for u32 {
    fn reading(self) -> Option<u32> {
        (self != 0).then_some(self)
    }
}

impl Reading<f32> for f32 {
    fn reading(self) -> Option<f32> {
        (self != 0.0).then_some(self)
    }
}
