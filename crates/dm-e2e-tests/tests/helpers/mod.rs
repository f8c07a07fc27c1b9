//! Shared test harness for E2E integration tests.
//!
//! Bridges the controller's `ControlSurface` and the device's
//! `DisplayAgent` through two `MockConnector`s. `pump` plays the broker:
//! it routes what one side published to the other side's subscriptions and
//! replays retained messages to new subscribers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use dm_controller::{ControlSurface, ControllerConfig};
use dm_display_agent::{AgentConfig, DisplayAgent, MockDisplay};
use dm_mqtt_channel::{ConnectionManager, MockChannel, MockConnector, SessionEvent};

/// Cursor into one side's mock channel.
#[derive(Default)]
struct Cursor {
    published: usize,
    subscriptions: usize,
}

/// End-to-end harness wiring controller + display agent via mocks.
pub struct TestHarness {
    pub surface: ControlSurface,
    pub agent: DisplayAgent,
    /// Controller-side transport.
    pub controller: Arc<MockConnector>,
    /// Device-side transport.
    pub device: Arc<MockConnector>,
    /// What the agent drove on its display.
    pub display: MockDisplay,
    retained: HashMap<String, Vec<u8>>,
    controller_cursor: Cursor,
    device_cursor: Cursor,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_configs(ControllerConfig::default(), AgentConfig::default())
    }

    pub fn with_configs(controller_config: ControllerConfig, agent_config: AgentConfig) -> Self {
        let controller = Arc::new(MockConnector::new());
        let device = Arc::new(MockConnector::new());
        let display = MockDisplay::new();

        let surface = ControlSurface::new(
            ConnectionManager::new(controller.clone()),
            &controller_config,
        );
        let agent = DisplayAgent::new(
            ConnectionManager::new(device.clone()),
            agent_config,
            Box::new(display.clone()),
        );

        Self {
            surface,
            agent,
            controller,
            device,
            display,
            retained: HashMap::new(),
            controller_cursor: Cursor::default(),
            device_cursor: Cursor::default(),
        }
    }

    /// Start the agent and let the broker accept it.
    pub fn start_device(&mut self) {
        self.agent.start();
        self.device.emit(SessionEvent::Established);
        self.pump();
    }

    /// Connect the controller and let the broker accept it.
    pub fn connect_controller(&mut self) {
        self.surface.connect();
        self.controller.emit(SessionEvent::Established);
        self.pump();
    }

    /// Bring both sides online.
    pub fn connect_both(&mut self) {
        self.start_device();
        self.connect_controller();
    }

    /// Route everything published since the last pump until both sides
    /// are quiet.
    pub fn pump(&mut self) {
        loop {
            let moved = route(
                &self.controller,
                &mut self.controller_cursor,
                &self.device,
                &mut self.retained,
            ) + route(
                &self.device,
                &mut self.device_cursor,
                &self.controller,
                &mut self.retained,
            ) + replay_retained(&self.controller, &mut self.controller_cursor, &self.retained)
                + replay_retained(&self.device, &mut self.device_cursor, &self.retained);
            if moved == 0 {
                break;
            }
        }
    }

    pub fn controller_channel(&self) -> Arc<MockChannel> {
        self.controller.channel()
    }

    pub fn device_channel(&self) -> Arc<MockChannel> {
        self.device.channel()
    }
}

/// Forward new publishes from `from` to `to` when `to` subscribed to the
/// topic. Returns how many messages were delivered.
fn route(
    from: &MockConnector,
    cursor: &mut Cursor,
    to: &MockConnector,
    retained: &mut HashMap<String, Vec<u8>>,
) -> usize {
    let published = from.channel().published();
    let fresh = published.get(cursor.published..).unwrap_or_default().to_vec();
    cursor.published = published.len();

    let mut delivered = 0;
    for message in fresh {
        if message.retain {
            retained.insert(message.topic.clone(), message.payload.clone());
        }
        if to.channel().is_subscribed_to(&message.topic)
            && to.emit(SessionEvent::Message {
                topic: message.topic,
                payload: message.payload,
            })
        {
            delivered += 1;
        }
    }
    delivered
}

/// Deliver retained messages matching subscriptions made since the last
/// pump.
fn replay_retained(
    side: &MockConnector,
    cursor: &mut Cursor,
    retained: &HashMap<String, Vec<u8>>,
) -> usize {
    let subscriptions = side.channel().subscriptions();
    let fresh = subscriptions
        .get(cursor.subscriptions..)
        .unwrap_or_default()
        .to_vec();
    cursor.subscriptions = subscriptions.len();

    let mut delivered = 0;
    for (filter, _) in fresh {
        if let Some(payload) = retained.get(&filter) {
            if side.emit(SessionEvent::Message {
                topic: filter,
                payload: payload.clone(),
            }) {
                delivered += 1;
            }
        }
    }
    delivered
}
