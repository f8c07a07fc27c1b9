use crate::error::{ProtocolError, ProtocolResult};

/// Liveness reported by the display on the status topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    /// Wire form of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    /// Parse a status payload (case-insensitive, surrounding whitespace ignored).
    pub fn parse(payload: &str) -> ProtocolResult<Self> {
        match payload.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(ProtocolError::UnknownStatus(payload.to_string())),
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
