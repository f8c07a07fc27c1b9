//! Shared protocol types for the dot-matrix display controller.
//!
//! Used by both sides of the MQTT link: the controller publishes
//! `DisplayCommand`s, the display agent parses them and reports its
//! `DeviceStatus` back on the status topic.

pub mod brightness;
pub mod command;
pub mod error;
pub mod status;
pub mod topics;

pub use command::DisplayCommand;
pub use error::{ProtocolError, ProtocolResult};
pub use status::DeviceStatus;
