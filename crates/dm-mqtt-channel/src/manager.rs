//! Connection manager: a single broker session and its observers.
//!
//! Every operation returns immediately. Outcomes surface later through
//! the connection-state listeners (`Fn(bool)`) and message listeners
//! (`Fn(topic, payload)`), invoked on whichever task delivered the
//! session event. Failures are logged and never returned to the caller.
//!
//! Each session attempt carries a generation number. Events from a
//! session that was disconnected or replaced are dropped, so a late
//! CONNACK cannot flip the state back to connected.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use dm_protocol::{DisplayCommand, topics};
use rumqttc::QoS;

use crate::address::BrokerAddress;
use crate::channel::{Channel, RumqttConnector};
use crate::config::ConnectOptions;
use crate::error::MqttError;
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::session::{Connector, SessionEvent};

/// Called with the new connection state.
pub type ConnectionListener = dyn Fn(bool) + Send + Sync;

/// Called with `(topic, payload)` for every inbound message.
pub type MessageListener = dyn Fn(&str, &str) + Send + Sync;

/// Shared handle to the broker session.
///
/// Cloning is cheap and every clone drives the same session, so one
/// instance can be handed to every part of an application. Listeners that
/// capture a clone keep the manager alive until they are removed.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

struct Shared {
    connector: Arc<dyn Connector>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    connected: bool,
    /// Generation of the most recent session attempt.
    generation: u64,
    session: Option<Arc<dyn Channel>>,
    /// The current attempt was established before `open` returned its
    /// channel. Applied once the channel is stored.
    established_early: bool,
    connection_listeners: ListenerRegistry<ConnectionListener>,
    message_listeners: ListenerRegistry<MessageListener>,
}

impl ConnectionManager {
    /// Create a manager that opens sessions through `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            shared: Arc::new(Shared {
                connector,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Create a manager backed by rumqttc. Sessions must be opened from
    /// within a tokio runtime.
    pub fn mqtt() -> Self {
        Self::new(Arc::new(RumqttConnector))
    }

    // ── Session lifecycle ─────────────────────────────────────

    /// Open a session to `address` (`mqtt://[user:pass@]host[:port]`).
    ///
    /// An existing session is disconnected first. The outcome is only
    /// observable through the connection listeners; setup failures
    /// notify `false`.
    pub fn connect(&self, address: &str, options: ConnectOptions) {
        self.disconnect();

        let address = match BrokerAddress::parse(address) {
            Ok(address) => address,
            Err(e) => return self.construction_failed(&e),
        };
        let client_id = options.resolve_client_id();

        let generation = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.established_early = false;
            state.generation
        };
        let sink = EventSink {
            generation,
            shared: Arc::downgrade(&self.shared),
        };

        tracing::info!(
            broker = %address,
            client_id = %client_id,
            generation,
            "connecting to MQTT broker"
        );

        match self
            .shared
            .connector
            .open(&client_id, &address, &options, sink)
        {
            Ok(channel) => {
                let mut state = self.shared.lock();
                if state.generation == generation {
                    state.session = Some(channel);
                    if std::mem::take(&mut state.established_early) {
                        tracing::info!("MQTT connected");
                        set_connected(state, true);
                    }
                } else {
                    drop(state);
                    tracing::debug!(generation, "session superseded during setup, closing");
                    if let Err(e) = channel.disconnect() {
                        tracing::warn!(error = %e, "failed to close superseded session");
                    }
                }
            }
            Err(e) => self.construction_failed(&e),
        }
    }

    /// Close the current session.
    ///
    /// Marks the manager disconnected and notifies `false` right away,
    /// without waiting for the broker. Does nothing, and notifies no one,
    /// when there is no session.
    pub fn disconnect(&self) {
        let mut state = self.shared.lock();
        let Some(channel) = state.session.take() else {
            tracing::debug!("disconnect requested without a session");
            return;
        };
        state.generation += 1;
        state.connected = false;
        state.established_early = false;
        let listeners = state.connection_listeners.snapshot();
        drop(state);

        if let Err(e) = channel.disconnect() {
            tracing::warn!(error = %e, "MQTT disconnect request failed");
        }
        tracing::info!("MQTT disconnected");
        notify_connection(&listeners, false);
    }

    /// Last known connection state. Not re-checked against the transport.
    pub fn connection_status(&self) -> bool {
        self.shared.lock().connected
    }

    // ── Messaging ─────────────────────────────────────────────

    /// Subscribe the session to `topic`. Ignored while disconnected.
    pub fn subscribe(&self, topic: &str) {
        let Some(channel) = self.connected_channel() else {
            tracing::debug!(topic = %topic, "not connected, skipping subscribe");
            return;
        };
        match channel.subscribe(topic, QoS::AtLeastOnce) {
            Ok(()) => tracing::info!(topic = %topic, "subscribed"),
            Err(e) => tracing::error!(topic = %topic, error = %e, "subscribe failed"),
        }
    }

    /// Publish at least once. Dropped with a warning while disconnected.
    pub fn publish(&self, topic: &str, payload: &str) {
        self.publish_with_retain(topic, payload, false);
    }

    /// Publish with the retain flag set, so late subscribers see it.
    pub fn publish_retained(&self, topic: &str, payload: &str) {
        self.publish_with_retain(topic, payload, true);
    }

    /// Publish a display command on its topic.
    pub fn send(&self, command: &DisplayCommand) {
        self.publish(command.topic(), &command.payload());
    }

    /// Send text for the display, verbatim.
    pub fn send_display_text(&self, text: &str) {
        self.publish(topics::DISPLAY_TEXT, text);
    }

    /// Send a brightness level as its decimal string. No range check.
    pub fn send_brightness(&self, level: u8) {
        self.send(&DisplayCommand::Brightness(level));
    }

    // ── Listeners ─────────────────────────────────────────────

    pub fn add_connection_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared
            .lock()
            .connection_listeners
            .add(Arc::new(listener))
    }

    pub fn remove_connection_listener(&self, id: ListenerId) -> bool {
        self.shared.lock().connection_listeners.remove(id)
    }

    pub fn add_message_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.shared.lock().message_listeners.add(Arc::new(listener))
    }

    pub fn remove_message_listener(&self, id: ListenerId) -> bool {
        self.shared.lock().message_listeners.remove(id)
    }

    // ── Internal helpers ──────────────────────────────────────

    fn connected_channel(&self) -> Option<Arc<dyn Channel>> {
        let state = self.shared.lock();
        if state.connected {
            state.session.clone()
        } else {
            None
        }
    }

    fn publish_with_retain(&self, topic: &str, payload: &str, retain: bool) {
        let Some(channel) = self.connected_channel() else {
            tracing::warn!(
                topic = %topic,
                error = %MqttError::NotConnected,
                "cannot publish, dropping message"
            );
            return;
        };
        match channel.publish(topic, payload.as_bytes(), QoS::AtLeastOnce, retain) {
            Ok(()) => tracing::info!(topic = %topic, payload = %payload, retain, "published"),
            Err(e) => tracing::error!(topic = %topic, error = %e, "publish failed"),
        }
    }

    fn construction_failed(&self, error: &MqttError) {
        tracing::error!(error = %error, "MQTT connection error");
        set_connected(self.shared.lock(), false);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a session event. Returns `false` if the session that produced
    /// it has been retired, telling the transport to stop.
    fn dispatch(&self, generation: u64, event: SessionEvent) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "ignoring event from retired session"
            );
            return false;
        }

        match event {
            SessionEvent::Established if state.session.is_none() => {
                tracing::debug!(generation, "established before setup finished, deferring");
                state.established_early = true;
            }
            SessionEvent::Established => {
                tracing::info!("MQTT connected");
                set_connected(state, true);
            }
            SessionEvent::TransportError(error) => {
                tracing::error!(error = %error, "MQTT transport error");
                set_connected(state, false);
            }
            SessionEvent::Closed => {
                tracing::info!("MQTT connection closed");
                set_connected(state, false);
            }
            SessionEvent::Offline => {
                tracing::warn!("MQTT offline");
                set_connected(state, false);
            }
            SessionEvent::Message { topic, payload } => {
                let payload = String::from_utf8_lossy(&payload);
                tracing::info!(topic = %topic, payload = %payload, "received message");
                let listeners = state.message_listeners.snapshot();
                drop(state);
                for listener in &listeners {
                    listener(&topic, &payload);
                }
            }
        }
        true
    }
}

/// Store the new state, then notify with the lock released so listeners
/// can call back into the manager.
fn set_connected(mut state: MutexGuard<'_, State>, connected: bool) {
    state.connected = connected;
    state.established_early = false;
    let listeners = state.connection_listeners.snapshot();
    drop(state);
    notify_connection(&listeners, connected);
}

fn notify_connection(listeners: &[Arc<ConnectionListener>], connected: bool) {
    for listener in listeners {
        listener(connected);
    }
}

/// Delivery handle given to a `Connector` for one session attempt.
#[derive(Clone)]
pub struct EventSink {
    generation: u64,
    shared: Weak<Shared>,
}

impl EventSink {
    /// Report a session event.
    ///
    /// Returns `false` once the session is retired (disconnected, replaced,
    /// or the manager dropped); the transport should stop delivering.
    pub fn emit(&self, event: SessionEvent) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.dispatch(self.generation, event))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
