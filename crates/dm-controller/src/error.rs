use thiserror::Error;

/// Why the control surface refused a user action.
#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("not connected: connect to the broker before sending")]
    NotConnected,

    #[error("please enter some text")]
    EmptyText,

    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid brightness '{0}', expected a number from 0 to 100")]
    InvalidBrightness(String),
}

pub type ControlResult<T> = Result<T, ControlError>;
