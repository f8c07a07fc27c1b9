//! Display output seam.
//!
//! Rendering (fonts, scrolling, SPI) lives outside this crate. The agent
//! only tells a `Display` what to show; `LogDisplay` logs it and
//! `MockDisplay` records it for tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dm_protocol::brightness;

/// Something that can show text at a brightness.
pub trait Display: Send {
    /// Replace the text being shown.
    fn show_text(&mut self, text: &str);

    /// Set the brightness. `contrast` is the matching 0–255 register value.
    fn set_brightness(&mut self, level: u8, contrast: u8);
}

/// What the display is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub text: String,
    /// Brightness level, 0–15.
    pub level: u8,
    /// When a command last changed the state. `None` until the first one.
    pub updated_at: Option<DateTime<Utc>>,
}

impl DisplayState {
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level: level.min(brightness::MAX_LEVEL),
            updated_at: None,
        }
    }

    pub fn contrast(&self) -> u8 {
        brightness::contrast(self.level)
    }
}

/// Display that only logs what it would show.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl Display for LogDisplay {
    fn show_text(&mut self, text: &str) {
        tracing::info!(text = %text, "display text updated");
    }

    fn set_brightness(&mut self, level: u8, contrast: u8) {
        tracing::info!(
            level,
            max = brightness::MAX_LEVEL,
            contrast,
            "display brightness set"
        );
    }
}

/// A recorded display call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Text(String),
    Brightness { level: u8, contrast: u8 },
}

/// Recording display for tests. Clones share the same call log.
#[derive(Debug, Default, Clone)]
pub struct MockDisplay {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<DisplayCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl Display for MockDisplay {
    fn show_text(&mut self, text: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(DisplayCall::Text(text.to_string()));
    }

    fn set_brightness(&mut self, level: u8, contrast: u8) {
        self.calls
            .lock()
            .unwrap()
            .push(DisplayCall::Brightness { level, contrast });
    }
}
