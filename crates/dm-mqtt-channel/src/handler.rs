//! Translation of rumqttc event-loop output into session events.

use std::io::ErrorKind;

use rumqttc::{ConnectionError, Event, Packet};

use crate::session::SessionEvent;

/// Classify an event-loop event. Returns `None` for protocol traffic the
/// manager does not care about (acks, pings, outgoing packets).
pub fn classify(event: Event) -> Option<SessionEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Some(SessionEvent::Established),
        Event::Incoming(Packet::Publish(publish)) => Some(SessionEvent::Message {
            topic: publish.topic,
            payload: publish.payload.to_vec(),
        }),
        Event::Incoming(Packet::Disconnect) => Some(SessionEvent::Closed),
        _ => None,
    }
}

/// Classify an event-loop error.
///
/// Timeouts mean the broker went quiet (offline); a reset or EOF on the
/// socket means the connection was closed; anything else is an error.
pub fn classify_error(error: &ConnectionError) -> SessionEvent {
    match error {
        ConnectionError::NetworkTimeout => SessionEvent::Offline,
        ConnectionError::Io(e) if is_closed(e.kind()) => SessionEvent::Closed,
        other => SessionEvent::TransportError(other.to_string()),
    }
}

fn is_closed(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::{ConnAck, ConnectReturnCode, Outgoing, Publish, QoS};

    #[test]
    fn connack_is_established() {
        let event = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        )));
        assert_eq!(classify(event), Some(SessionEvent::Established));
    }

    #[test]
    fn publish_is_message() {
        let publish = Publish::new("dotmatrix/status", QoS::AtLeastOnce, "online");
        let event = Event::Incoming(Packet::Publish(publish));
        assert_eq!(
            classify(event),
            Some(SessionEvent::Message {
                topic: "dotmatrix/status".into(),
                payload: b"online".to_vec(),
            })
        );
    }

    #[test]
    fn broker_disconnect_is_closed() {
        let event = Event::Incoming(Packet::Disconnect);
        assert_eq!(classify(event), Some(SessionEvent::Closed));
    }

    #[test]
    fn protocol_noise_is_ignored() {
        assert_eq!(classify(Event::Incoming(Packet::PingResp)), None);
        assert_eq!(classify(Event::Outgoing(Outgoing::PingReq)), None);
        assert_eq!(classify(Event::Outgoing(Outgoing::Publish(1))), None);
    }

    #[test]
    fn timeout_is_offline() {
        assert_eq!(
            classify_error(&ConnectionError::NetworkTimeout),
            SessionEvent::Offline
        );
    }

    #[test]
    fn reset_is_closed() {
        let error = ConnectionError::Io(std::io::Error::from(ErrorKind::ConnectionReset));
        assert_eq!(classify_error(&error), SessionEvent::Closed);
    }

    #[test]
    fn refused_is_error() {
        let error = ConnectionError::Io(std::io::Error::from(ErrorKind::ConnectionRefused));
        assert!(matches!(
            classify_error(&error),
            SessionEvent::TransportError(_)
        ));

        let error = ConnectionError::ConnectionRefused(ConnectReturnCode::NotAuthorized);
        assert!(matches!(
            classify_error(&error),
            SessionEvent::TransportError(msg) if msg.contains("NotAuthorized")
        ));
    }
}
