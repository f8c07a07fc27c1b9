//! Controller configuration, loadable from TOML.

use dm_mqtt_channel::MqttConfig;
use serde::Deserialize;

/// Top-level configuration for the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// MQTT connection settings.
    #[serde(default)]
    pub mqtt: MqttConfig,
    /// Slider position at startup, in percent.
    #[serde(default = "default_brightness")]
    pub initial_brightness: f64,
}

fn default_brightness() -> f64 {
    50.0
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig::default(),
            initial_brightness: default_brightness(),
        }
    }
}

impl ControllerConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
