//! Metric kinds and published data points

use crate::classifier::TransitionTarget;
use alarm_state::{AlarmNotification, AlarmState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reliability metric derived from alarm transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReliabilityMetric {
    /// Failure to next failure
    #[serde(rename = "MTBF")]
    MeanTimeBetweenFailures,
    /// Failure to recovery
    #[serde(rename = "MTTR")]
    MeanTimeToRecovery,
    /// Recovery to next failure
    #[serde(rename = "MTTF")]
    MeanTimeToFailure,
}

impl ReliabilityMetric {
    pub const ALL: [ReliabilityMetric; 3] = [
        Self::MeanTimeBetweenFailures,
        Self::MeanTimeToRecovery,
        Self::MeanTimeToFailure,
    ];

    /// Published metric name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MeanTimeBetweenFailures => "MTBF",
            Self::MeanTimeToRecovery => "MTTR",
            Self::MeanTimeToFailure => "MTTF",
        }
    }

    /// States the metric measures between
    pub const fn target(&self) -> TransitionTarget {
        match self {
            Self::MeanTimeBetweenFailures => {
                TransitionTarget::new(AlarmState::Failing, AlarmState::Failing)
            }
            Self::MeanTimeToRecovery => TransitionTarget::new(AlarmState::Healthy, AlarmState::Failing),
            Self::MeanTimeToFailure => TransitionTarget::new(AlarmState::Failing, AlarmState::Healthy),
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::MeanTimeBetweenFailures => "Seconds between consecutive failures of a service",
            Self::MeanTimeToRecovery => "Seconds from failure to recovery of a service",
            Self::MeanTimeToFailure => "Seconds from recovery to the next failure of a service",
        }
    }
}

impl fmt::Display for ReliabilityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single duration data point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationMetric {
    pub metric_name: String,
    /// Value of the `service` dimension
    pub alarm_name: String,
    pub timestamp: DateTime<Utc>,
    pub seconds: u64,
}

impl DurationMetric {
    /// Data point for `notification`, stamped with its emission time
    pub fn for_notification(
        metric: ReliabilityMetric,
        notification: &AlarmNotification,
        seconds: u64,
    ) -> Self {
        Self {
            metric_name: metric.name().to_string(),
            alarm_name: notification.alarm_name.clone(),
            timestamp: notification.event_time,
            seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets() {
        let mtbf = ReliabilityMetric::MeanTimeBetweenFailures.target();
        assert_eq!(mtbf.new_state, AlarmState::Failing);
        assert_eq!(mtbf.old_state, AlarmState::Failing);

        let mttr = ReliabilityMetric::MeanTimeToRecovery.target();
        assert_eq!(mttr.new_state, AlarmState::Healthy);
        assert_eq!(mttr.old_state, AlarmState::Failing);

        let mttf = ReliabilityMetric::MeanTimeToFailure.target();
        assert_eq!(mttf.new_state, AlarmState::Failing);
        assert_eq!(mttf.old_state, AlarmState::Healthy);
    }

    #[test]
    fn test_names() {
        let names: Vec<_> = ReliabilityMetric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["MTBF", "MTTR", "MTTF"]);
    }
}
