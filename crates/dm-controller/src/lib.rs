//! Dot-matrix controller: control surface over the MQTT connection manager.
//!
//! Re-exports all modules so the terminal front-end and the e2e tests
//! share the same `ControlSurface`.

pub mod command;
pub mod config;
pub mod error;
pub mod repl;
pub mod surface;

pub use command::Command;
pub use config::ControllerConfig;
pub use error::{ControlError, ControlResult};
pub use surface::{ControlSurface, DeviceReport};
