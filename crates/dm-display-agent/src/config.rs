//! Display agent configuration, loadable from TOML.

use std::time::Duration;

use dm_mqtt_channel::{ConnectOptions, MqttConfig, WillMessage};
use dm_protocol::{DeviceStatus, brightness, topics};
use serde::Deserialize;

/// Top-level configuration for the display agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// MQTT connection settings.
    #[serde(default)]
    pub mqtt: MqttConfig,
    /// Fixed client id, so the broker sees one identity per display.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Interval between `online` heartbeats.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    /// Text shown until the first command arrives.
    #[serde(default = "default_initial_text")]
    pub initial_text: String,
    /// Brightness level (0–15) at startup.
    #[serde(default = "default_initial_brightness")]
    pub initial_brightness: u8,
}

fn default_client_id() -> String {
    "RaspberryPi_DotMatrix".to_string()
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_initial_text() -> String {
    "Ready".to_string()
}

fn default_initial_brightness() -> u8 {
    5
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig::default(),
            client_id: default_client_id(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            initial_text: default_initial_text(),
            initial_brightness: default_initial_brightness(),
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        anyhow::ensure!(
            config.heartbeat_interval_secs > 0,
            "heartbeat_interval_secs must be at least 1"
        );
        Ok(config)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Session options: the configured client id plus a retained
    /// `offline` last will on the status topic.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            client_id: Some(self.client_id.clone()),
            last_will: Some(WillMessage {
                topic: topics::STATUS.to_string(),
                payload: DeviceStatus::Offline.as_str().to_string(),
                retain: true,
            }),
            ..self.mqtt.connect_options()
        }
    }

    /// Initial brightness, clamped into the display range.
    pub fn initial_level(&self) -> u8 {
        brightness::clamp_level(self.initial_brightness.into())
    }
}
