//! Control surface: the user-editable state of the controller and the
//! actions bound to it.
//!
//! Holds the broker URL, the text to display and the brightness slider,
//! forwards user intent to the shared `ConnectionManager`, and mirrors the
//! manager's connection state and the device's status reports.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use dm_mqtt_channel::{ConnectionManager, ListenerId, MqttConfig};
use dm_protocol::{DeviceStatus, brightness, topics};

use crate::config::ControllerConfig;
use crate::error::{ControlError, ControlResult};

/// Last payload seen on the status topic.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    /// Raw payload as received.
    pub payload: String,
    /// Parsed status, if the payload was a known one.
    pub status: Option<DeviceStatus>,
    pub received_at: DateTime<Utc>,
}

/// State written by manager callbacks, read by the surface.
#[derive(Debug, Default)]
struct Mirror {
    connected: bool,
    device: Option<DeviceReport>,
}

pub struct ControlSurface {
    manager: ConnectionManager,
    mqtt: MqttConfig,
    broker_url: String,
    display_text: String,
    /// Slider position, percent.
    brightness: f64,
    mirror: Arc<Mutex<Mirror>>,
    connection_listener: ListenerId,
    message_listener: ListenerId,
}

impl ControlSurface {
    /// Attach a surface to the shared manager.
    ///
    /// Registers its listeners immediately; they are removed, and the
    /// session closed, when the surface is dropped.
    pub fn new(manager: ConnectionManager, config: &ControllerConfig) -> Self {
        let mirror = Arc::new(Mutex::new(Mirror {
            connected: manager.connection_status(),
            device: None,
        }));

        let connection_listener = {
            let mirror = Arc::clone(&mirror);
            let handle = manager.clone();
            manager.add_connection_listener(move |connected| {
                lock(&mirror).connected = connected;
                if connected {
                    handle.subscribe(topics::STATUS);
                }
            })
        };

        let message_listener = {
            let mirror = Arc::clone(&mirror);
            manager.add_message_listener(move |topic, payload| {
                if topic != topics::STATUS {
                    return;
                }
                let status = DeviceStatus::parse(payload).ok();
                if status.is_none() {
                    tracing::debug!(payload = %payload, "unrecognized device status");
                }
                lock(&mirror).device = Some(DeviceReport {
                    payload: payload.to_string(),
                    status,
                    received_at: Utc::now(),
                });
            })
        };

        Self {
            manager,
            mqtt: config.mqtt.clone(),
            broker_url: config.mqtt.broker_url.clone(),
            display_text: String::new(),
            brightness: brightness::clamp_percent(config.initial_brightness),
            mirror,
            connection_listener,
            message_listener,
        }
    }

    // ── Connection ────────────────────────────────────────────

    pub fn broker_url(&self) -> &str {
        &self.broker_url
    }

    pub fn set_broker_url(&mut self, url: impl Into<String>) {
        self.broker_url = url.into();
    }

    /// Mirrored connection state.
    pub fn is_connected(&self) -> bool {
        lock(&self.mirror).connected
    }

    /// Open a session to the current broker URL with the configured
    /// options. The result arrives through the connection listener.
    pub fn connect(&self) {
        self.manager
            .connect(&self.broker_url, self.mqtt.connect_options());
    }

    pub fn disconnect(&self) {
        self.manager.disconnect();
    }

    /// Connect button: disconnect when connected, connect otherwise.
    /// Returns `true` if a connection attempt was started.
    pub fn toggle_connection(&self) -> bool {
        if self.is_connected() {
            self.disconnect();
            false
        } else {
            self.connect();
            true
        }
    }

    // ── Display text ──────────────────────────────────────────

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn set_display_text(&mut self, text: impl Into<String>) {
        self.display_text = text.into();
    }

    /// Send the current text. Refused while disconnected or when the text
    /// is blank; otherwise published untrimmed.
    pub fn send_text(&self) -> ControlResult<()> {
        if !self.is_connected() {
            return Err(ControlError::NotConnected);
        }
        if self.display_text.trim().is_empty() {
            return Err(ControlError::EmptyText);
        }
        self.manager.send_display_text(&self.display_text);
        Ok(())
    }

    // ── Brightness ────────────────────────────────────────────

    /// Slider position in percent.
    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Display level (0–15) for the current slider position. This is both
    /// the label and the value sent to the display.
    pub fn brightness_level(&self) -> u8 {
        brightness::level_from_percent(self.brightness)
    }

    /// Move the slider. When connected, the new level is sent right away.
    /// Returns the resulting level.
    pub fn set_brightness(&mut self, percent: f64) -> u8 {
        self.brightness = brightness::clamp_percent(percent);
        let level = self.brightness_level();
        if self.is_connected() {
            self.manager.send_brightness(level);
        }
        level
    }

    // ── Device status ─────────────────────────────────────────

    pub fn device_report(&self) -> Option<DeviceReport> {
        lock(&self.mirror).device.clone()
    }
}

impl Drop for ControlSurface {
    fn drop(&mut self) {
        self.manager
            .remove_connection_listener(self.connection_listener);
        self.manager.remove_message_listener(self.message_listener);
        self.manager.disconnect();
    }
}

fn lock(mirror: &Mutex<Mirror>) -> std::sync::MutexGuard<'_, Mirror> {
    mirror.lock().unwrap_or_else(PoisonError::into_inner)
}
