use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

/// MQTT connection configuration, loadable from TOML.
///
/// Every field has a default, so an empty `[mqtt]` table (or none at all)
/// connects to the public test broker with the stock session options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker URI, `mqtt://host:port`.
    pub broker_url: String,
    /// Username; empty disables authentication.
    pub username: String,
    /// Password; ignored when `username` is empty.
    pub password: String,
    /// Keep-alive interval in seconds.
    pub keepalive_secs: u16,
    /// Start a clean session on every connect.
    pub clean_session: bool,
    /// Delay between transport reconnect attempts. Zero disables retries.
    pub reconnect_period_ms: u64,
    /// Socket connect timeout.
    pub connect_timeout_ms: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: DEFAULT_BROKER_URL.to_string(),
            username: String::new(),
            password: String::new(),
            keepalive_secs: DEFAULT_KEEPALIVE_SECS,
            clean_session: true,
            reconnect_period_ms: DEFAULT_RECONNECT_PERIOD_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl MqttConfig {
    /// Session options for this config. Credentials are only set when a
    /// username is configured.
    pub fn connect_options(&self) -> ConnectOptions {
        let (username, password) = if self.username.is_empty() {
            (None, None)
        } else {
            (
                Some(self.username.clone()),
                (!self.password.is_empty()).then(|| self.password.clone()),
            )
        };

        ConnectOptions {
            username,
            password,
            keep_alive: Duration::from_secs(self.keepalive_secs.into()),
            clean_session: self.clean_session,
            reconnect_period: Duration::from_millis(self.reconnect_period_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            ..ConnectOptions::default()
        }
    }
}

pub const DEFAULT_BROKER_URL: &str = "mqtt://broker.hivemq.com:1883";
const DEFAULT_KEEPALIVE_SECS: u16 = 60;
const DEFAULT_RECONNECT_PERIOD_MS: u64 = 1000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 4000;

/// Prefix of generated client identifiers.
const CLIENT_ID_PREFIX: &str = "dotmatrix_";

/// Per-connect session options.
///
/// Callers override individual fields over the defaults with struct
/// update syntax:
/// ```ignore
/// let options = ConnectOptions {
///     username: Some("display".into()),
///     ..ConnectOptions::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Explicit client id. `None` generates `dotmatrix_<8 hex>`.
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
    pub clean_session: bool,
    pub reconnect_period: Duration,
    pub connect_timeout: Duration,
    /// Message the broker publishes on our behalf if the session dies.
    pub last_will: Option<WillMessage>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            client_id: None,
            username: None,
            password: None,
            keep_alive: Duration::from_secs(DEFAULT_KEEPALIVE_SECS.into()),
            clean_session: true,
            reconnect_period: Duration::from_millis(DEFAULT_RECONNECT_PERIOD_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            last_will: None,
        }
    }
}

impl ConnectOptions {
    /// The configured client id, or a freshly generated one.
    pub fn resolve_client_id(&self) -> String {
        self.client_id.clone().unwrap_or_else(generate_client_id)
    }
}

/// Last-will message registered with the broker at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WillMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Generate a process-random client id, `dotmatrix_` + 8 hex digits.
pub fn generate_client_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{CLIENT_ID_PREFIX}{}", &suffix[..8])
}
