//! Dot-matrix controller: terminal front-end.
//!
//! Reads line commands from stdin and drives a `ControlSurface` over a
//! rumqttc-backed connection manager. Logs go to stderr.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use dm_controller::command::HELP;
use dm_controller::repl::{self, Outcome};
use dm_controller::{Command, ControlSurface, ControllerConfig};
use dm_mqtt_channel::ConnectionManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dm-controller starting");

    // ── Load config ─────────────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::from_file(&path)?,
        None => ControllerConfig::default(),
    };
    tracing::info!(broker = %config.mqtt.broker_url, "config loaded");

    // ── Connection manager + surface ────────────────────────────
    let manager = ConnectionManager::mqtt();
    manager.add_connection_listener(|connected| {
        if connected {
            println!("* connected");
        } else {
            println!("* disconnected");
        }
    });
    manager.add_message_listener(|topic, payload| println!("* [{topic}] {payload}"));

    let mut surface = ControlSurface::new(manager, &config);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match repl::execute(&mut surface, command) {
                    Outcome::Reply(reply) => println!("{reply}"),
                    Outcome::Quit => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    drop(surface);
    tracing::info!("dm-controller stopped");
    Ok(())
}
