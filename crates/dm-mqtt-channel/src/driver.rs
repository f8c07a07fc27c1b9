//! MQTT event loop driver.
//!
//! Polls the rumqttc event loop for one session and forwards what it sees
//! to the connection manager through the session's `EventSink`.

use std::time::Duration;

use rumqttc::{Event, EventLoop, Outgoing};

use crate::handler;
use crate::manager::EventSink;

/// Drive the event loop until the session is retired.
///
/// Stops once our DISCONNECT has gone out, once the manager rejects an
/// event as stale, or after the first error when `reconnect_period` is
/// zero. Otherwise errors are reported and the next poll reconnects after
/// `reconnect_period`.
pub async fn run(mut eventloop: EventLoop, sink: EventSink, reconnect_period: Duration) {
    let generation = sink.generation();
    tracing::debug!(generation, "MQTT driver started");

    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!(generation, "disconnect sent");
                break;
            }
            Ok(event) => {
                let Some(event) = handler::classify(event) else {
                    continue;
                };
                if !sink.emit(event) {
                    break;
                }
            }
            Err(e) => {
                if !sink.emit(handler::classify_error(&e)) {
                    break;
                }
                if reconnect_period.is_zero() {
                    tracing::info!(generation, "reconnect disabled, giving up on session");
                    break;
                }
                tracing::debug!(
                    generation,
                    retry_in_ms = reconnect_period.as_millis() as u64,
                    "MQTT reconnecting"
                );
                tokio::time::sleep(reconnect_period).await;
            }
        }
    }

    tracing::debug!(generation, "MQTT driver stopped");
}
