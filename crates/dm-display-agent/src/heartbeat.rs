//! Periodic liveness publisher.
//!
//! Sends `online` on the status topic at a configurable interval so the
//! controller knows the display is alive.

use std::time::Duration;

use dm_mqtt_channel::ConnectionManager;
use dm_protocol::{DeviceStatus, topics};
use tokio::time;

/// Run the heartbeat loop, publishing at `interval`.
///
/// `interval` must be non-zero; `AgentConfig` rejects a zero interval.
/// This function runs forever until the task is cancelled. Ticks while
/// disconnected are skipped rather than dropped with a warning.
pub async fn run(manager: &ConnectionManager, interval: Duration) {
    let mut ticker = time::interval(interval);
    // Skip the first tick (fires immediately).
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if manager.connection_status() {
            manager.publish(topics::STATUS, DeviceStatus::Online.as_str());
            tracing::debug!("heartbeat sent");
        } else {
            tracing::debug!("disconnected, skipping heartbeat");
        }
    }
}
