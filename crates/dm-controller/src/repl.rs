//! Executes parsed commands against a control surface and renders the
//! replies shown to the user.

use crate::command::{Command, HELP};
use crate::surface::ControlSurface;

/// What the front-end should do after a command.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Print the reply and read the next line.
    Reply(String),
    Quit,
}

pub fn execute(surface: &mut ControlSurface, command: Command) -> Outcome {
    let reply = match command {
        Command::Connect(url) => {
            if let Some(url) = url {
                surface.set_broker_url(url);
            }
            surface.connect();
            format!("connecting to {}...", surface.broker_url())
        }
        Command::Disconnect => {
            surface.disconnect();
            "disconnected".to_string()
        }
        Command::Text(text) => {
            surface.set_display_text(text);
            match surface.send_text() {
                Ok(()) => format!("text sent: {}", surface.display_text()),
                Err(e) => e.to_string(),
            }
        }
        Command::Brightness(percent) => {
            let level = surface.set_brightness(percent);
            let suffix = if surface.is_connected() {
                ""
            } else {
                " (not sent, disconnected)"
            };
            format!("brightness {level}/15 ({:.0}%){suffix}", surface.brightness())
        }
        Command::Status => render_status(surface),
        Command::Help => HELP.to_string(),
        Command::Quit => return Outcome::Quit,
    };
    Outcome::Reply(reply)
}

fn render_status(surface: &ControlSurface) -> String {
    let connection = if surface.is_connected() {
        "connected"
    } else {
        "disconnected"
    };
    let device = match surface.device_report() {
        Some(report) => format!(
            "{} (at {})",
            report.payload,
            report.received_at.format("%H:%M:%S")
        ),
        None => "unknown".to_string(),
    };
    format!(
        "broker:     {} [{connection}]\ntext:       {:?}\nbrightness: {}/15\ndevice:     {device}",
        surface.broker_url(),
        surface.display_text(),
        surface.brightness_level(),
    )
}
