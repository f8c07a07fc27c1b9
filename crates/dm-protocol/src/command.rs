//! Commands carried on the display topics.

use crate::brightness;
use crate::error::{ProtocolError, ProtocolResult};
use crate::topics;

/// A command for the display, as published by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCommand {
    /// Replace the scrolling text. No length or charset restriction.
    Text(String),
    /// Set the brightness level. The sender decides the scale.
    Brightness(u8),
}

impl DisplayCommand {
    /// Topic this command is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Text(_) => topics::DISPLAY_TEXT,
            Self::Brightness(_) => topics::BRIGHTNESS,
        }
    }

    /// Wire payload: the text verbatim, or the level in decimal.
    pub fn payload(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Brightness(level) => level.to_string(),
        }
    }

    /// Interpret an inbound publish on one of the display topics.
    ///
    /// Brightness payloads are parsed on the display's 0–15 scale and
    /// clamped into it.
    pub fn parse(topic: &str, payload: &str) -> ProtocolResult<Self> {
        match topic {
            topics::DISPLAY_TEXT => Ok(Self::Text(payload.to_string())),
            topics::BRIGHTNESS => brightness::parse_level(payload).map(Self::Brightness),
            other => Err(ProtocolError::UnknownTopic(other.to_string())),
        }
    }
}
