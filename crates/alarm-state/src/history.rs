//! Alarm history records and boundary search
//!
//! History is always handled newest first. A *boundary* is a record whose new
//! state is meaningful; `INSUFFICIENT_DATA` records are skipped by every scan
//! without ending it.

use crate::error::HistoryError;
use crate::notification::{parse_timestamp, AlarmNotification};
use crate::state::AlarmState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Kind of entry in the alarm history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryItemType {
    ConfigurationUpdate,
    StateUpdate,
    Action,
}

/// Raw history entry as returned by the history source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmHistoryItem {
    pub alarm_name: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub history_item_type: HistoryItemType,
    /// JSON document with `oldState` / `newState`
    pub history_data: String,
    #[serde(default)]
    pub history_summary: String,
}

impl AlarmHistoryItem {
    /// Same alarm, instant, kind and payload
    fn is_same_entry(&self, other: &AlarmHistoryItem) -> bool {
        self.alarm_name == other.alarm_name
            && self.timestamp == other.timestamp
            && self.history_item_type == other.history_item_type
            && self.history_data == other.history_data
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryData {
    #[serde(default)]
    version: String,
    old_state: HistoryState,
    new_state: HistoryState,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryState {
    state_value: AlarmState,
    #[serde(default)]
    state_reason: String,
}

/// A state update from the alarm history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub alarm_name: String,
    pub timestamp: DateTime<Utc>,
    pub old_state: AlarmState,
    pub new_state: AlarmState,
}

impl HistoryRecord {
    pub fn new(
        alarm_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        old_state: AlarmState,
        new_state: AlarmState,
    ) -> Self {
        Self {
            alarm_name: alarm_name.into(),
            timestamp,
            old_state,
            new_state,
        }
    }

    /// Decode a state update history item
    pub fn from_item(item: &AlarmHistoryItem) -> Result<Self, HistoryError> {
        if item.history_item_type != HistoryItemType::StateUpdate {
            return Err(HistoryError::InvalidData(format!(
                "{:?} is not a state update",
                item.history_item_type
            )));
        }

        let data: HistoryData = serde_json::from_str(&item.history_data)?;
        Ok(Self::new(
            item.alarm_name.clone(),
            item.timestamp,
            data.old_state.state_value,
            data.new_state.state_value,
        ))
    }

    /// Whether this record marks a real boundary
    pub fn is_boundary(&self) -> bool {
        self.new_state.is_meaningful()
    }

    /// Encode as a state update history item
    pub fn to_item(&self) -> Result<AlarmHistoryItem, HistoryError> {
        let data = HistoryData {
            version: "1.0".to_string(),
            old_state: HistoryState {
                state_value: self.old_state,
                state_reason: String::new(),
            },
            new_state: HistoryState {
                state_value: self.new_state,
                state_reason: String::new(),
            },
        };

        Ok(AlarmHistoryItem {
            alarm_name: self.alarm_name.clone(),
            timestamp: self.timestamp,
            history_item_type: HistoryItemType::StateUpdate,
            history_data: serde_json::to_string(&data)?,
            history_summary: format!(
                "Alarm updated from {} to {}",
                self.old_state, self.new_state
            ),
        })
    }
}

impl From<&AlarmNotification> for HistoryRecord {
    fn from(notification: &AlarmNotification) -> Self {
        Self::new(
            notification.alarm_name.clone(),
            notification.transition_instant(),
            notification.previous_state.value,
            notification.new_state.value,
        )
    }
}

/// Decode state updates from raw history items, newest first.
///
/// Items of other kinds are ignored; unreadable ones are logged and skipped.
pub fn state_records(items: &[AlarmHistoryItem]) -> Vec<HistoryRecord> {
    let mut records: Vec<HistoryRecord> = items
        .iter()
        .filter(|item| item.history_item_type == HistoryItemType::StateUpdate)
        .filter_map(|item| match HistoryRecord::from_item(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping history item for {}: {}", item.alarm_name, e);
                None
            }
        })
        .collect();

    sort_reverse_chronological(&mut records);
    records
}

/// Order records newest first; ties keep their input order
pub fn sort_reverse_chronological(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Nearest boundary strictly before `instant`
pub fn previous_boundary(
    history: &[HistoryRecord],
    instant: DateTime<Utc>,
) -> Option<&HistoryRecord> {
    history
        .iter()
        .filter(|record| record.timestamp < instant)
        .find(|record| record.is_boundary())
}

/// Most recent record strictly before `instant` that entered `state`.
///
/// Never matches `INSUFFICIENT_DATA`, even when asked for it.
pub fn latest_boundary_with_state(
    history: &[HistoryRecord],
    instant: DateTime<Utc>,
    state: AlarmState,
) -> Option<&HistoryRecord> {
    if !state.is_meaningful() {
        return None;
    }

    history
        .iter()
        .filter(|record| record.timestamp < instant)
        .find(|record| record.new_state == state)
}

/// Alarm history lookup capability
#[async_trait]
pub trait AlarmHistorySource: Send + Sync {
    /// Raw history items of one kind for an alarm, newest first
    async fn describe_history(
        &self,
        alarm_name: &str,
        item_type: HistoryItemType,
    ) -> Result<Vec<AlarmHistoryItem>, HistoryError>;

    /// Decoded state updates for an alarm, newest first
    async fn state_history(&self, alarm_name: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        let items = self
            .describe_history(alarm_name, HistoryItemType::StateUpdate)
            .await?;
        Ok(state_records(&items))
    }
}

/// In-process alarm history
pub struct MemoryHistory {
    items: Mutex<HashMap<String, Vec<AlarmHistoryItem>>>,
    /// Max items kept per alarm
    max_items_per_alarm: usize,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// History keeping at most `max_items_per_alarm` entries per alarm
    pub fn with_capacity(max_items_per_alarm: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            max_items_per_alarm: max_items_per_alarm.max(1),
        }
    }

    /// Append a raw history item.
    ///
    /// Returns `false` without storing anything when an identical entry is
    /// already held, i.e. the item is a redelivery.
    pub fn push(&self, item: AlarmHistoryItem) -> Result<bool, HistoryError> {
        let mut items = self.items.lock().map_err(|e| HistoryError::Lookup {
            alarm: item.alarm_name.clone(),
            reason: format!("Lock error: {}", e),
        })?;

        let entries = items.entry(item.alarm_name.clone()).or_default();
        if entries.iter().any(|entry| entry.is_same_entry(&item)) {
            debug!("Duplicate history entry for {} at {}", item.alarm_name, item.timestamp);
            return Ok(false);
        }

        if entries.len() >= self.max_items_per_alarm {
            let oldest = entries
                .iter()
                .enumerate()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(idx, _)| idx);
            if let Some(idx) = oldest {
                entries.remove(idx);
            }
        }
        entries.push(item);
        Ok(true)
    }

    /// Append a state update; `false` when it was already recorded
    pub fn push_record(&self, record: &HistoryRecord) -> Result<bool, HistoryError> {
        self.push(record.to_item()?)
    }

    /// Record the state update carried by a notification; `false` when the
    /// same update was already recorded
    pub fn record_notification(&self, notification: &AlarmNotification) -> Result<bool, HistoryError> {
        debug!(
            "Recording {} -> {} for {}",
            notification.previous_state.value, notification.new_state.value, notification.alarm_name
        );
        self.push_record(&HistoryRecord::from(notification))
    }

    /// Number of items held for an alarm
    pub fn len(&self, alarm_name: &str) -> usize {
        self.items
            .lock()
            .map(|items| items.get(alarm_name).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlarmHistorySource for MemoryHistory {
    async fn describe_history(
        &self,
        alarm_name: &str,
        item_type: HistoryItemType,
    ) -> Result<Vec<AlarmHistoryItem>, HistoryError> {
        let items = self.items.lock().map_err(|e| HistoryError::Lookup {
            alarm: alarm_name.to_string(),
            reason: format!("Lock error: {}", e),
        })?;

        let mut matching: Vec<AlarmHistoryItem> = items
            .get(alarm_name)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|item| item.history_item_type == item_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching)
    }
}
