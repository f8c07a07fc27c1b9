//! Line commands accepted by the terminal front-end.

use crate::error::{ControlError, ControlResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Connect, optionally switching to another broker URL first.
    Connect(Option<String>),
    Disconnect,
    /// Set the display text and send it.
    Text(String),
    /// Move the brightness slider (percent).
    Brightness(f64),
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// The argument of `text` is kept verbatim after the single space
    /// following the verb.
    pub fn parse(line: &str) -> ControlResult<Option<Self>> {
        let line = line.trim_start();
        if line.trim().is_empty() {
            return Ok(None);
        }

        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb, Some(arg)),
            None => (line.trim_end(), None),
        };
        let trimmed_arg = arg.map(str::trim).filter(|a| !a.is_empty());

        let command = match verb.to_ascii_lowercase().as_str() {
            "connect" | "c" => Self::Connect(trimmed_arg.map(str::to_string)),
            "disconnect" | "d" => Self::Disconnect,
            "text" | "t" => match arg {
                Some(text) if !text.is_empty() => Self::Text(text.to_string()),
                _ => return Err(ControlError::MissingArgument("text")),
            },
            "brightness" | "b" => {
                let value = trimmed_arg.ok_or(ControlError::MissingArgument("brightness"))?;
                let percent = value
                    .parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite())
                    .ok_or_else(|| ControlError::InvalidBrightness(value.to_string()))?;
                Self::Brightness(percent)
            }
            "status" | "s" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ControlError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

pub const HELP: &str = "\
commands:
  connect [url]        connect (or reconnect) to the broker
  disconnect           close the session
  text <message>       send text to the display
  brightness <0-100>   set brightness (sent as level 0-15)
  status               show connection and device state
  help                 show this help
  quit                 disconnect and exit";
