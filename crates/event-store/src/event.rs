//! Persisted transition event

use alarm_state::AlarmState;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One real state transition of an alarm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    /// Alarm identity
    pub id: String,
    /// Opaque correlation key
    pub resource_id: String,
    pub state: AlarmState,
    /// +1 entering failure, -1 recovering
    pub value: i8,
    /// Instant the alarm entered `state`
    pub event_time: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn new(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        state: AlarmState,
        event_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            state,
            value: state.transition_value(),
            event_time,
        }
    }

    /// Sortable text form of `event_time`
    pub fn event_time_text(&self) -> String {
        self.event_time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_value_follows_state() {
        let at = Utc.with_ymd_and_hms(2019, 12, 12, 6, 25, 41).unwrap();
        assert_eq!(TransitionEvent::new("a", "r", AlarmState::Failing, at).value, 1);
        assert_eq!(TransitionEvent::new("a", "r", AlarmState::Healthy, at).value, -1);
    }

    #[test]
    fn test_serialized_shape() {
        let at = Utc.with_ymd_and_hms(2019, 12, 12, 6, 25, 41).unwrap();
        let event = TransitionEvent::new("flaky-service", "1577082070_pipeline5", AlarmState::Healthy, at);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["id"], "flaky-service");
        assert_eq!(json["resourceId"], "1577082070_pipeline5");
        assert_eq!(json["state"], "OK");
        assert_eq!(json["value"], -1);
        assert_eq!(event.event_time_text(), "2019-12-12T06:25:41.000Z");
    }
}
