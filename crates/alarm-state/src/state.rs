//! Three-state alarm model

use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alarm state as reported by the monitoring source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmState {
    /// Service is healthy ("OK")
    #[serde(rename = "OK")]
    Healthy,
    /// Service is failing ("ALARM")
    #[serde(rename = "ALARM")]
    Failing,
    /// Not enough data to evaluate ("INSUFFICIENT_DATA")
    #[serde(rename = "INSUFFICIENT_DATA")]
    Indeterminate,
}

impl AlarmState {
    /// Wire representation of the state
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "OK",
            Self::Failing => "ALARM",
            Self::Indeterminate => "INSUFFICIENT_DATA",
        }
    }

    /// Whether the state marks a real boundary.
    ///
    /// `Indeterminate` is a pass-through state: it never counts as the
    /// previous state of a transition and never blocks a history scan.
    pub const fn is_meaningful(&self) -> bool {
        !matches!(self, Self::Indeterminate)
    }

    /// Transition value recorded when entering this state
    pub const fn transition_value(&self) -> i8 {
        match self {
            Self::Failing => 1,
            Self::Healthy => -1,
            Self::Indeterminate => 0,
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmState {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(Self::Healthy),
            "ALARM" => Ok(Self::Failing),
            "INSUFFICIENT_DATA" => Ok(Self::Indeterminate),
            other => Err(StateError::UnknownState(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!("OK".parse::<AlarmState>().unwrap(), AlarmState::Healthy);
        assert_eq!("ALARM".parse::<AlarmState>().unwrap(), AlarmState::Failing);
        assert_eq!(
            "INSUFFICIENT_DATA".parse::<AlarmState>().unwrap(),
            AlarmState::Indeterminate
        );
        assert!("ok".parse::<AlarmState>().is_err());
        assert_eq!(AlarmState::Failing.to_string(), "ALARM");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&AlarmState::Indeterminate).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_DATA\"");

        let state: AlarmState = serde_json::from_str("\"OK\"").unwrap();
        assert_eq!(state, AlarmState::Healthy);
    }

    #[test]
    fn test_meaningful_states() {
        assert!(AlarmState::Healthy.is_meaningful());
        assert!(AlarmState::Failing.is_meaningful());
        assert!(!AlarmState::Indeterminate.is_meaningful());
    }

    #[test]
    fn test_transition_values() {
        assert_eq!(AlarmState::Failing.transition_value(), 1);
        assert_eq!(AlarmState::Healthy.transition_value(), -1);
        assert_eq!(AlarmState::Indeterminate.transition_value(), 0);
    }
}
