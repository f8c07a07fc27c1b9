//! Display agent: binds the display to the MQTT session.
//!
//! On every (re)connect the agent subscribes to the display topics and
//! announces itself with a retained `online` on the status topic. Inbound
//! commands update the `DisplayState` and are forwarded to the `Display`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use dm_mqtt_channel::{ConnectionManager, ListenerId};
use dm_protocol::{DeviceStatus, DisplayCommand, brightness, topics};

use crate::config::AgentConfig;
use crate::display::{Display, DisplayState};

struct Screen {
    display: Box<dyn Display>,
    state: DisplayState,
}

pub struct DisplayAgent {
    manager: ConnectionManager,
    config: AgentConfig,
    screen: Arc<Mutex<Screen>>,
    connection_listener: ListenerId,
    message_listener: ListenerId,
}

impl DisplayAgent {
    /// Attach an agent to `manager` and show the initial state.
    pub fn new(manager: ConnectionManager, config: AgentConfig, display: Box<dyn Display>) -> Self {
        let state = DisplayState::new(config.initial_text.clone(), config.initial_level());
        let mut screen = Screen { display, state };
        screen.display.show_text(&screen.state.text);
        screen
            .display
            .set_brightness(screen.state.level, screen.state.contrast());
        let screen = Arc::new(Mutex::new(screen));

        let connection_listener = {
            let handle = manager.clone();
            manager.add_connection_listener(move |connected| {
                if connected {
                    announce(&handle);
                }
            })
        };

        let message_listener = {
            let screen = Arc::clone(&screen);
            manager.add_message_listener(move |topic, payload| {
                handle_message(&mut lock(&screen), topic, payload);
            })
        };

        Self {
            manager,
            config,
            screen,
            connection_listener,
            message_listener,
        }
    }

    /// Connect to the configured broker.
    pub fn start(&self) {
        tracing::info!(
            broker = %self.config.mqtt.broker_url,
            client_id = %self.config.client_id,
            "display agent connecting"
        );
        self.manager
            .connect(&self.config.mqtt.broker_url, self.config.connect_options());
    }

    /// Current display state.
    pub fn state(&self) -> DisplayState {
        lock(&self.screen).state.clone()
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Announce `offline` and close the session.
    pub fn shutdown(&self) {
        self.manager
            .publish_retained(topics::STATUS, DeviceStatus::Offline.as_str());
        self.manager.disconnect();
        tracing::info!("display agent stopped");
    }
}

impl Drop for DisplayAgent {
    fn drop(&mut self) {
        self.manager
            .remove_connection_listener(self.connection_listener);
        self.manager.remove_message_listener(self.message_listener);
    }
}

fn announce(manager: &ConnectionManager) {
    for topic in topics::DISPLAY_INBOUND {
        manager.subscribe(topic);
    }
    manager.publish_retained(topics::STATUS, DeviceStatus::Online.as_str());
}

fn handle_message(screen: &mut Screen, topic: &str, payload: &str) {
    if !topics::is_dotmatrix_topic(topic) {
        tracing::debug!(topic = %topic, "foreign topic, skipping");
        return;
    }
    let command = match DisplayCommand::parse(topic, payload) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!(topic = %topic, error = %e, "ignoring message");
            return;
        }
    };

    match command {
        DisplayCommand::Text(text) => {
            screen.display.show_text(&text);
            screen.state.text = text;
        }
        DisplayCommand::Brightness(level) => {
            screen.state.level = level;
            let contrast = screen.state.contrast();
            screen.display.set_brightness(level, contrast);
            tracing::info!(level, max = brightness::MAX_LEVEL, "brightness updated");
        }
    }
    screen.state.updated_at = Some(Utc::now());
}

fn lock(screen: &Mutex<Screen>) -> MutexGuard<'_, Screen> {
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayCall, MockDisplay};
    use dm_mqtt_channel::{MockConnector, SessionEvent};
    use dm_mqtt_channel::QoS;

    fn setup() -> (DisplayAgent, Arc<MockConnector>, MockDisplay) {
        let connector = Arc::new(MockConnector::new());
        let manager = ConnectionManager::new(connector.clone());
        let display = MockDisplay::new();
        let agent = DisplayAgent::new(manager, AgentConfig::default(), Box::new(display.clone()));
        (agent, connector, display)
    }

    fn started() -> (DisplayAgent, Arc<MockConnector>, MockDisplay) {
        let (agent, connector, display) = setup();
        agent.start();
        connector.emit(SessionEvent::Established);
        (agent, connector, display)
    }

    fn deliver(connector: &MockConnector, topic: &str, payload: &str) {
        assert!(connector.emit(SessionEvent::Message {
            topic: topic.into(),
            payload: payload.as_bytes().to_vec(),
        }));
    }

    #[test]
    fn shows_initial_state() {
        let (agent, _, display) = setup();
        assert_eq!(
            display.calls(),
            vec![
                DisplayCall::Text("Ready".into()),
                DisplayCall::Brightness {
                    level: 5,
                    contrast: 85
                },
            ]
        );
        assert_eq!(agent.state().text, "Ready");
    }

    #[test]
    fn start_uses_agent_identity_and_will() {
        let (agent, connector, _) = setup();
        agent.start();

        let session = connector.last_session().unwrap();
        assert_eq!(session.client_id, "RaspberryPi_DotMatrix");
        assert_eq!(session.address.host, "broker.hivemq.com");
        assert!(session.options.last_will.is_some());
    }

    #[test]
    fn connect_subscribes_and_announces() {
        let (_agent, connector, _) = started();
        let channel = connector.channel();

        assert!(channel.is_subscribed_to(topics::DISPLAY_TEXT));
        assert!(channel.is_subscribed_to(topics::BRIGHTNESS));
        assert!(!channel.is_subscribed_to(topics::STATUS));

        let status = channel.published_to(topics::STATUS);
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].payload_str(), "online");
        assert!(status[0].retain);
        assert_eq!(status[0].qos, QoS::AtLeastOnce);
    }

    #[test]
    fn reconnect_announces_again() {
        let (_agent, connector, _) = started();
        connector.emit(SessionEvent::Offline);
        connector.emit(SessionEvent::Established);

        assert_eq!(connector.channel().published_to(topics::STATUS).len(), 2);
    }

    #[test]
    fn text_command_updates_display() {
        let (agent, connector, display) = started();
        deliver(&connector, topics::DISPLAY_TEXT, "HELLO");

        assert_eq!(display.last_call(), Some(DisplayCall::Text("HELLO".into())));
        let state = agent.state();
        assert_eq!(state.text, "HELLO");
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn brightness_command_sets_contrast() {
        let (agent, connector, display) = started();
        deliver(&connector, topics::BRIGHTNESS, "7");

        assert_eq!(
            display.last_call(),
            Some(DisplayCall::Brightness {
                level: 7,
                contrast: 119
            })
        );
        assert_eq!(agent.state().level, 7);
    }

    #[test]
    fn brightness_is_clamped() {
        let (agent, connector, _) = started();
        deliver(&connector, topics::BRIGHTNESS, "100");
        assert_eq!(agent.state().level, 15);
    }

    #[test]
    fn invalid_brightness_is_ignored() {
        let (agent, connector, display) = started();
        let before = display.calls().len();
        deliver(&connector, topics::BRIGHTNESS, "bright");

        assert_eq!(display.calls().len(), before);
        assert_eq!(agent.state().level, 5);
        assert!(agent.state().updated_at.is_none());
    }

    #[test]
    fn shutdown_announces_offline() {
        let (agent, connector, _) = started();
        agent.shutdown();

        let status = connector.channel().published_to(topics::STATUS);
        assert_eq!(status.last().unwrap().payload_str(), "offline");
        assert!(status.last().unwrap().retain);
        assert!(!agent.manager().connection_status());
        assert_eq!(connector.channel().disconnect_count(), 1);
    }

    #[test]
    fn drop_detaches_listeners() {
        let connector = Arc::new(MockConnector::new());
        let manager = ConnectionManager::new(connector.clone());
        let display = MockDisplay::new();
        let agent = DisplayAgent::new(
            manager.clone(),
            AgentConfig::default(),
            Box::new(display.clone()),
        );
        drop(agent);

        manager.connect("mqtt://localhost:1883", Default::default());
        connector.emit(SessionEvent::Established);
        deliver(&connector, topics::DISPLAY_TEXT, "HELLO");

        assert!(connector.channel().subscriptions().is_empty());
        assert_eq!(display.calls().len(), 2); // initial state only
    }
}
