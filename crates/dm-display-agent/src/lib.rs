//! Dot-matrix display agent: library crate for the device side.
//!
//! Receives display commands over MQTT, keeps the display state, and
//! reports liveness on the status topic. Re-exports all modules so the
//! e2e tests can drive a `DisplayAgent` against mocks.

pub mod agent;
pub mod config;
pub mod display;
pub mod heartbeat;

pub use agent::DisplayAgent;
pub use config::AgentConfig;
pub use display::{Display, DisplayCall, DisplayState, LogDisplay, MockDisplay};
