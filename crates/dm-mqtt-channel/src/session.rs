//! Session lifecycle events and the transport factory seam.

use std::sync::Arc;

use crate::address::BrokerAddress;
use crate::channel::Channel;
use crate::config::ConnectOptions;
use crate::error::MqttResult;
use crate::manager::EventSink;

/// A lifecycle or data event reported by a broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The broker accepted the session (CONNACK).
    Established,
    /// The transport reported an error. The session is no longer usable
    /// until the transport reconnects.
    TransportError(String),
    /// The connection was closed, by the broker or the network.
    Closed,
    /// The broker stopped answering.
    Offline,
    /// An inbound publish on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
}

/// Opens broker sessions.
///
/// `open` must not block: it sets the session up and returns its
/// `Channel`, then reports everything that happens afterwards through
/// `sink`. Enables substituting a fake transport in tests.
pub trait Connector: Send + Sync {
    fn open(
        &self,
        client_id: &str,
        address: &BrokerAddress,
        options: &ConnectOptions,
        sink: EventSink,
    ) -> MqttResult<Arc<dyn Channel>>;
}
