//! Alarm state-change notifications
//!
//! [`AlarmEvent`] mirrors the inbound envelope as delivered by the event bus.
//! [`AlarmNotification`] is the typed view the rest of the workspace works
//! with: parsed states and timestamps, nothing else.

use crate::error::StateError;
use crate::state::AlarmState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound state-change envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmEvent {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "detail-type", default)]
    pub detail_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub account: String,
    /// Emission time (ISO-8601)
    pub time: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub resources: Vec<String>,
    pub detail: AlarmDetail,
}

/// Alarm payload of the envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDetail {
    pub alarm_name: String,
    pub state: StateTransition,
    pub previous_state: StateTransition,
    #[serde(default)]
    pub configuration: AlarmConfiguration,
}

/// One side of a state change as it appears on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransition {
    pub value: AlarmState,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_data: Option<String>,
    pub timestamp: String,
}

/// Alarm configuration block; carried through untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmConfiguration {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<serde_json::Value>,
}

impl AlarmEvent {
    /// Parse an envelope from JSON
    pub fn from_json(raw: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// State value at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub value: AlarmState,
    pub timestamp: DateTime<Utc>,
}

impl StateSnapshot {
    pub fn new(value: AlarmState, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

/// Typed alarm notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmNotification {
    /// Logical name of the monitored resource
    pub alarm_name: String,
    pub new_state: StateSnapshot,
    pub previous_state: StateSnapshot,
    /// Wall-clock time the notification was emitted
    pub event_time: DateTime<Utc>,
}

impl AlarmNotification {
    /// Instant the alarm entered its new state
    pub fn transition_instant(&self) -> DateTime<Utc> {
        self.new_state.timestamp
    }

    /// The source does not guarantee the two states differ
    pub fn is_no_op(&self) -> bool {
        self.new_state.value == self.previous_state.value
    }
}

impl TryFrom<&AlarmEvent> for AlarmNotification {
    type Error = StateError;

    fn try_from(event: &AlarmEvent) -> Result<Self, Self::Error> {
        let detail = &event.detail;
        if detail.alarm_name.is_empty() {
            return Err(StateError::Malformed("empty alarm name".to_string()));
        }

        Ok(Self {
            alarm_name: detail.alarm_name.clone(),
            new_state: StateSnapshot::new(
                detail.state.value,
                parse_timestamp(&detail.state.timestamp)?,
            ),
            previous_state: StateSnapshot::new(
                detail.previous_state.value,
                parse_timestamp(&detail.previous_state.timestamp)?,
            ),
            event_time: parse_timestamp(&event.time)?,
        })
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 as well as the colon-less offset form the alarm source
/// emits (`2019-12-12T06:25:41.200+0000`).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StateError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StateError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EVENT: &str = r#"{
        "version": "0",
        "id": "abcdfgh-7edc-nmop-qrst-efghjkl",
        "detail-type": "CloudWatch Alarm State Change",
        "source": "aws.cloudwatch",
        "account": "12345",
        "time": "2019-11-18T07:03:51Z",
        "region": "ap-southeast-2",
        "resources": ["arn:aws:cloudwatch:ap-southeast-2:12345:alarm:flaky-service"],
        "detail": {
            "alarmName": "flaky-service",
            "state": {
                "value": "OK",
                "reason": "Threshold Crossed",
                "reasonData": "{\"version\":\"1.0\"}",
                "timestamp": "2019-12-12T06:25:41.200+0000"
            },
            "previousState": {
                "value": "INSUFFICIENT_DATA",
                "reason": "Threshold Crossed",
                "timestamp": "2019-11-18T06:57:51.679+0000"
            },
            "configuration": {
                "description": "Example alarm for a flaky service"
            }
        }
    }"#;

    #[test]
    fn test_parse_envelope() {
        let event = AlarmEvent::from_json(EVENT).unwrap();
        assert_eq!(event.detail_type, "CloudWatch Alarm State Change");
        assert_eq!(event.detail.alarm_name, "flaky-service");
        assert_eq!(event.detail.state.value, AlarmState::Healthy);
        assert_eq!(event.detail.previous_state.value, AlarmState::Indeterminate);
        assert!(event.detail.previous_state.reason_data.is_none());
    }

    #[test]
    fn test_notification_from_envelope() {
        let event = AlarmEvent::from_json(EVENT).unwrap();
        let notification = AlarmNotification::try_from(&event).unwrap();

        assert_eq!(notification.alarm_name, "flaky-service");
        assert_eq!(
            notification.transition_instant(),
            Utc.with_ymd_and_hms(2019, 12, 12, 6, 25, 41).unwrap()
                + chrono::Duration::milliseconds(200)
        );
        assert_eq!(
            notification.event_time,
            Utc.with_ymd_and_hms(2019, 11, 18, 7, 3, 51).unwrap()
        );
        assert!(!notification.is_no_op());
    }

    #[test]
    fn test_unknown_state_rejected() {
        let raw = EVENT.replace("\"value\": \"OK\"", "\"value\": \"BROKEN\"");
        assert!(AlarmEvent::from_json(&raw).is_err());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let mut event = AlarmEvent::from_json(EVENT).unwrap();
        event.time = "yesterday".to_string();
        let err = AlarmNotification::try_from(&event).unwrap_err();
        assert!(matches!(err, StateError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2019, 1, 1, 0, 2, 30).unwrap();
        assert_eq!(parse_timestamp("2019-01-01T00:02:30.000Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2019-01-01T00:02:30+0000").unwrap(), expected);
        assert_eq!(parse_timestamp("2019-01-01T02:02:30.000+0200").unwrap(), expected);
    }
}
