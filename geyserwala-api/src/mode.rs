//! Operating modes and setpoint limits

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lowest setpoint the device accepts, in °C
pub const MIN_SETPOINT: i64 = 30;
/// Highest setpoint the device accepts unless it reports its own cap, in °C
pub const MAX_SETPOINT: i64 = 65;

/// Device operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Hold the setpoint continuously
    Setpoint,
    /// Follow the timer schedule
    Timer,
    /// Heat from the solar collector or PV panel
    Solar,
    /// Keep the tank from freezing only
    Holiday,
    /// Element off
    Standby,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Setpoint,
        Mode::Timer,
        Mode::Solar,
        Mode::Holiday,
        Mode::Standby,
    ];

    /// Wire name used by the device API
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Setpoint => "SETPOINT",
            Mode::Timer => "TIMER",
            Mode::Solar => "SOLAR",
            Mode::Holiday => "HOLIDAY",
            Mode::Standby => "STANDBY",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Mode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Returned when a string is not one of the five mode names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_exact() {
        assert_eq!("TIMER".parse::<Mode>(), Ok(Mode::Timer));
        assert_eq!("STANDBY".parse::<Mode>(), Ok(Mode::Standby));
        assert!("timer".parse::<Mode>().is_err());
        assert!("BOOST".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_value(Mode::Holiday).unwrap(), "HOLIDAY");
        let mode: Mode = serde_json::from_value(serde_json::json!("SOLAR")).unwrap();
        assert_eq!(mode, Mode::Solar);
    }
}
