//! MQTT channel error types.

use thiserror::Error;

/// Errors that can occur during MQTT operations.
///
/// None of these reach callers of `ConnectionManager`; they are logged
/// and folded into the connection-state notification.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("connection setup failed: {0}")]
    Construction(String),

    #[error("invalid broker address: {0}")]
    InvalidAddress(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("subscribe error: {0}")]
    Subscribe(String),

    #[error("disconnect error: {0}")]
    Disconnect(String),

    #[error("not connected")]
    NotConnected,
}

/// Convenience alias for MQTT results.
pub type MqttResult<T> = Result<T, MqttError>;
