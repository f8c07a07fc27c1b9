//! MQTT topics for the dot-matrix display.
//!
//! Topic structure:
//! ```text
//! dotmatrix/display/text         controller -> display
//! dotmatrix/display/brightness   controller -> display
//! dotmatrix/status               display -> controller
//! ```

const PREFIX: &str = "dotmatrix";

/// Free text to show on the display, UTF-8, sent verbatim.
pub const DISPLAY_TEXT: &str = "dotmatrix/display/text";

/// Brightness level as an ASCII decimal integer.
pub const BRIGHTNESS: &str = "dotmatrix/display/brightness";

/// Status reported by the display (`online` / `offline`).
pub const STATUS: &str = "dotmatrix/status";

/// Topics the display agent subscribes to.
pub const DISPLAY_INBOUND: [&str; 2] = [DISPLAY_TEXT, BRIGHTNESS];

/// Whether a topic belongs to the dot-matrix hierarchy at all.
pub fn is_dotmatrix_topic(topic: &str) -> bool {
    topic.split('/').next() == Some(PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_share_prefix() {
        assert!(is_dotmatrix_topic(DISPLAY_TEXT));
        assert!(is_dotmatrix_topic(BRIGHTNESS));
        assert!(is_dotmatrix_topic(STATUS));
    }

    #[test]
    fn foreign_topic_rejected() {
        assert!(!is_dotmatrix_topic("fleet/alpha/status"));
        assert!(!is_dotmatrix_topic("dotmatrixx/status"));
        assert!(!is_dotmatrix_topic(""));
    }

    #[test]
    fn inbound_set_excludes_status() {
        assert!(!DISPLAY_INBOUND.contains(&STATUS));
        assert_eq!(DISPLAY_INBOUND.len(), 2);
    }
}
