use thiserror::Error;

/// Errors raised while interpreting dot-matrix payloads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid brightness value: {0:?}")]
    InvalidBrightness(String),

    #[error("unknown display topic: {0}")]
    UnknownTopic(String),

    #[error("unknown device status: {0:?}")]
    UnknownStatus(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
