//! Dot-matrix display agent: device-side receiver.
//!
//! Subscribes to the display topics, applies commands to the display and
//! reports `online` / `offline` on the status topic.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use dm_display_agent::{AgentConfig, DisplayAgent, LogDisplay, heartbeat};
use dm_mqtt_channel::ConnectionManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "dm-display-agent starting"
    );

    // ── Load config ─────────────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => AgentConfig::from_file(&path)?,
        None => AgentConfig::default(),
    };
    tracing::info!(
        broker = %config.mqtt.broker_url,
        client_id = %config.client_id,
        "config loaded"
    );
    let interval = config.heartbeat_interval();

    // ── Agent ───────────────────────────────────────────────────
    let manager = ConnectionManager::mqtt();
    let agent = DisplayAgent::new(manager, config, Box::new(LogDisplay));
    agent.start();

    tracing::info!("dm-display-agent ready");

    tokio::select! {
        () = heartbeat::run(agent.manager(), interval) => {
            tracing::error!("heartbeat loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    agent.shutdown();
    // Give the driver a moment to flush the offline status and DISCONNECT.
    tokio::time::sleep(Duration::from_millis(500)).await;

    Ok(())
}
