//! Brightness scales.
//!
//! The control surface works in percent (0–100). The display hardware
//! works in levels (0–15), which is also the value sent on the wire and
//! the number shown next to the slider.

use crate::error::{ProtocolError, ProtocolResult};

/// Highest level the display accepts.
pub const MAX_LEVEL: u8 = 15;

/// Upper bound of the percent scale.
pub const MAX_PERCENT: f64 = 100.0;

/// Contrast multiplier from level to the 0–255 hardware register.
const CONTRAST_STEP: u8 = 17;

/// Clamp a percent value into `0.0..=100.0`. NaN maps to zero.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, MAX_PERCENT)
}

/// Convert a percent value to the display level, rounding to nearest.
pub fn level_from_percent(percent: f64) -> u8 {
    let scaled = clamp_percent(percent) / MAX_PERCENT * f64::from(MAX_LEVEL);
    scaled.round() as u8
}

/// Clamp an arbitrary integer into the level range.
pub fn clamp_level(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_LEVEL)) as u8
}

/// Parse a brightness payload into a level, clamping out-of-range values.
pub fn parse_level(payload: &str) -> ProtocolResult<u8> {
    payload
        .trim()
        .parse::<i64>()
        .map(clamp_level)
        .map_err(|_| ProtocolError::InvalidBrightness(payload.to_string()))
}

/// Hardware contrast register value for a level (0–255).
pub fn contrast(level: u8) -> u8 {
    level.min(MAX_LEVEL) * CONTRAST_STEP
}
