//! MQTT channel: rumqttc-backed transport for the connection manager.
//!
//! Wraps `rumqttc::AsyncClient` behind the non-blocking `Channel` trait;
//! `RumqttConnector` builds a client per session and spawns the event
//! loop driver that feeds the manager.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, LastWill, MqttOptions, NetworkOptions, QoS};

use crate::address::BrokerAddress;
use crate::config::ConnectOptions;
use crate::driver;
use crate::error::{MqttError, MqttResult};
use crate::manager::EventSink;
use crate::session::Connector;

/// Capacity of the client -> event loop request queue.
const REQUEST_QUEUE_CAPACITY: usize = 64;

// ── Channel trait ─────────────────────────────────────────────

/// Abstraction for MQTT publishing and subscribing on an open session.
///
/// Methods enqueue the request and return without waiting for the
/// broker. Enables mocking in tests without a real MQTT broker.
pub trait Channel: Send + Sync {
    /// Publish a raw payload to a topic.
    fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> MqttResult<()>;

    /// Subscribe to a topic filter.
    fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()>;

    /// Request a graceful disconnect.
    fn disconnect(&self) -> MqttResult<()>;
}

// ── MqttChannel ───────────────────────────────────────────────

/// Plaintext MQTT channel backed by rumqttc.
///
/// The `EventLoop` is returned separately from `new()`; something must
/// poll it for any request to reach the broker.
pub struct MqttChannel {
    client: AsyncClient,
}

impl MqttChannel {
    pub fn new(
        client_id: &str,
        address: &BrokerAddress,
        options: &ConnectOptions,
    ) -> MqttResult<(Self, EventLoop)> {
        let mqtt_options = mqtt_options(client_id, address, options)?;
        let (client, mut eventloop) = AsyncClient::new(mqtt_options, REQUEST_QUEUE_CAPACITY);

        let mut network = NetworkOptions::new();
        network.set_connection_timeout(timeout_secs(options.connect_timeout));
        eventloop.set_network_options(network);

        Ok((Self { client }, eventloop))
    }
}

/// Start from the broker URL (credentials, query options), then apply the
/// session options. Keep-alive and clean-session always come from
/// `options`; its credentials replace the URL's when a username is set.
fn mqtt_options(
    client_id: &str,
    address: &BrokerAddress,
    options: &ConnectOptions,
) -> MqttResult<MqttOptions> {
    let mut mqtt_options = address.mqtt_options(client_id)?;
    mqtt_options
        .set_keep_alive(options.keep_alive)
        .set_clean_session(options.clean_session);

    if let Some(username) = &options.username {
        let password = options.password.clone().unwrap_or_default();
        mqtt_options.set_credentials(username.as_str(), password);
    }

    if let Some(will) = &options.last_will {
        mqtt_options.set_last_will(LastWill::new(
            will.topic.as_str(),
            will.payload.as_bytes().to_vec(),
            QoS::AtLeastOnce,
            will.retain,
        ));
    }

    Ok(mqtt_options)
}

/// rumqttc takes the connect timeout in whole seconds; round up.
fn timeout_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_millis().div_ceil(1000).max(1);
    u64::try_from(secs).unwrap_or(u64::MAX)
}

impl Channel for MqttChannel {
    fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> MqttResult<()> {
        self.client
            .try_publish(topic, qos, retain, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        self.client
            .try_subscribe(filter, qos)
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    fn disconnect(&self) -> MqttResult<()> {
        self.client
            .try_disconnect()
            .map_err(|e| MqttError::Disconnect(e.to_string()))
    }
}

// ── RumqttConnector ───────────────────────────────────────────

/// Opens rumqttc sessions and drives each on its own tokio task.
#[derive(Debug, Default, Clone, Copy)]
pub struct RumqttConnector;

impl Connector for RumqttConnector {
    fn open(
        &self,
        client_id: &str,
        address: &BrokerAddress,
        options: &ConnectOptions,
        sink: EventSink,
    ) -> MqttResult<Arc<dyn Channel>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MqttError::Construction(format!("no tokio runtime: {e}")))?;

        let (channel, eventloop) = MqttChannel::new(client_id, address, options)?;
        runtime.spawn(driver::run(eventloop, sink, options.reconnect_period));

        let channel: Arc<dyn Channel> = Arc::new(channel);
        Ok(channel)
    }
}
