//! MQTT connection management for the dot-matrix display.
//!
//! Provides a callback-driven MQTT abstraction shared by the controller
//! and the display agent:
//! - `ConnectionManager` owning at most one broker session, with
//!   connection-state and message listeners
//! - `Channel` / `Connector` traits at the transport seam (mockable in tests)
//! - `MqttChannel` / `RumqttConnector` backed by rumqttc
//! - `MockChannel` / `MockConnector` for testing without a broker

pub mod address;
pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod handler;
pub mod listeners;
pub mod manager;
pub mod mock;
pub mod session;

// Re-exports for convenience.
pub use address::BrokerAddress;
pub use channel::{Channel, MqttChannel, RumqttConnector};
pub use config::{ConnectOptions, MqttConfig, WillMessage};
pub use error::{MqttError, MqttResult};
pub use listeners::ListenerId;
pub use manager::{ConnectionManager, EventSink};
pub use mock::{MockChannel, MockConnector, OpenedSession, PublishedMessage};
pub use session::{Connector, SessionEvent};
pub use rumqttc::QoS;
