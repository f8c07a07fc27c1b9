//! Mock MQTT transport for testing without a real broker.
//!
//! `MockChannel` records all published messages, subscription filters and
//! disconnect requests. `MockConnector` hands out that channel for every
//! session and keeps each session's `EventSink`, so tests can play the
//! broker's side of the lifecycle.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rumqttc::QoS;

use crate::address::BrokerAddress;
use crate::channel::Channel;
use crate::config::ConnectOptions;
use crate::error::{MqttError, MqttResult};
use crate::manager::EventSink;
use crate::session::{Connector, SessionEvent};

/// A recorded publish call.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl PublishedMessage {
    /// Payload as text (lossy).
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Mock implementation of the `Channel` trait.
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockChannel {
    published: Mutex<Vec<PublishedMessage>>,
    subscriptions: Mutex<Vec<(String, QoS)>>,
    disconnects: AtomicUsize,
    fail_publishes: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
            fail_publishes: AtomicBool::new(false),
        }
    }

    /// Get all published messages.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Get all subscription filters.
    pub fn subscriptions(&self) -> Vec<(String, QoS)> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Get the last published message.
    pub fn last_published(&self) -> Option<PublishedMessage> {
        self.published.lock().unwrap().last().cloned()
    }

    /// Get published messages for a specific topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Check whether a subscription was made to the given filter.
    pub fn is_subscribed_to(&self, filter: &str) -> bool {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .any(|(f, _)| f == filter)
    }

    /// Number of disconnect requests received.
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Make subsequent publishes fail (and not be recorded).
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Clear all recorded state.
    pub fn reset(&self) {
        self.published.lock().unwrap().clear();
        self.subscriptions.lock().unwrap().clear();
        self.disconnects.store(0, Ordering::SeqCst);
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for MockChannel {
    fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> MqttResult<()> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(MqttError::Publish("request queue full".into()));
        }
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        self.subscriptions
            .lock()
            .unwrap()
            .push((filter.to_string(), qos));
        Ok(())
    }

    fn disconnect(&self) -> MqttResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A session opened through `MockConnector`.
#[derive(Debug, Clone)]
pub struct OpenedSession {
    pub client_id: String,
    pub address: BrokerAddress,
    pub options: ConnectOptions,
    pub sink: EventSink,
}

/// Mock implementation of the `Connector` trait.
///
/// Every session shares one `MockChannel`. Nothing happens on its own:
/// tests drive the session with `emit`.
pub struct MockConnector {
    channel: Arc<MockChannel>,
    sessions: Mutex<Vec<OpenedSession>>,
    fail_next: Mutex<Option<MqttError>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::with_channel(Arc::new(MockChannel::new()))
    }

    /// Use an existing channel, e.g. one shared with another connector.
    pub fn with_channel(channel: Arc<MockChannel>) -> Self {
        Self {
            channel,
            sessions: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// The channel handed out to every session.
    pub fn channel(&self) -> Arc<MockChannel> {
        Arc::clone(&self.channel)
    }

    /// Make the next `open` fail with `error`.
    pub fn fail_next_open(&self, error: MqttError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    /// All successfully opened sessions, oldest first.
    pub fn sessions(&self) -> Vec<OpenedSession> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn last_session(&self) -> Option<OpenedSession> {
        self.sessions.lock().unwrap().last().cloned()
    }

    /// Deliver an event on the most recent session. Returns what the
    /// manager answered, or `false` if no session was ever opened.
    pub fn emit(&self, event: SessionEvent) -> bool {
        let sink = self.last_session().map(|s| s.sink);
        sink.is_some_and(|sink| sink.emit(event))
    }

    /// Deliver an event on the `index`-th session (0 = oldest).
    pub fn emit_to(&self, index: usize, event: SessionEvent) -> bool {
        let sink = self.sessions.lock().unwrap().get(index).map(|s| s.sink.clone());
        sink.is_some_and(|sink| sink.emit(event))
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MockConnector {
    fn open(
        &self,
        client_id: &str,
        address: &BrokerAddress,
        options: &ConnectOptions,
        sink: EventSink,
    ) -> MqttResult<Arc<dyn Channel>> {
        if let Some(error) = self.fail_next.lock().unwrap().take() {
            return Err(error);
        }
        self.sessions.lock().unwrap().push(OpenedSession {
            client_id: client_id.to_string(),
            address: address.clone(),
            options: options.clone(),
            sink,
        });
        let channel: Arc<dyn Channel> = self.channel.clone();
        Ok(channel)
    }
}
