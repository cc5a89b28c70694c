//! Store Capability and In-Memory Implementation

use crate::event::TransitionEvent;
use crate::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// Durable store of transition events
#[async_trait]
pub trait TransitionStore: Send + Sync {
    /// Most recent transition recorded for an alarm
    async fn last_event(&self, id: &str) -> Result<Option<TransitionEvent>, StorageError>;

    /// Append a transition
    async fn put_event(&self, event: &TransitionEvent) -> Result<(), StorageError>;

    /// Recorded transitions for an alarm, newest first
    async fn events(&self, id: &str, limit: usize) -> Result<Vec<TransitionEvent>, StorageError>;
}

/// Transition store held in memory
pub struct MemoryStore {
    /// Events by alarm identity, in insertion order
    events: Mutex<HashMap<String, Vec<TransitionEvent>>>,
    /// Max events kept per alarm
    max_events_per_alarm: usize,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        info!("Creating in-memory transition store");
        Self {
            events: Mutex::new(HashMap::new()),
            max_events_per_alarm: 10_000,
        }
    }

    /// Store keeping at most `max_events_per_alarm` events per alarm
    pub fn with_retention(max_events_per_alarm: usize) -> Self {
        Self {
            max_events_per_alarm: max_events_per_alarm.max(1),
            ..Self::new()
        }
    }

    /// Total number of stored events
    pub fn event_count(&self) -> usize {
        self.events
            .lock()
            .map(|e| e.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Clear all data
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransitionStore for MemoryStore {
    async fn last_event(&self, id: &str) -> Result<Option<TransitionEvent>, StorageError> {
        let events = self.events.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        // max_by_key keeps the last of equal keys, i.e. the latest insert
        Ok(events
            .get(id)
            .and_then(|list| list.iter().max_by_key(|e| e.event_time))
            .cloned())
    }

    async fn put_event(&self, event: &TransitionEvent) -> Result<(), StorageError> {
        let mut events = self.events.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        let list = events.entry(event.id.clone()).or_default();

        // Enforce retention
        while list.len() >= self.max_events_per_alarm {
            list.remove(0);
        }

        list.push(event.clone());
        debug!("Stored {} transition for {}", event.state, event.id);
        Ok(())
    }

    async fn events(&self, id: &str, limit: usize) -> Result<Vec<TransitionEvent>, StorageError> {
        let events = self.events.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        let mut list: Vec<TransitionEvent> = events
            .get(id)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| b.event_time.cmp(&a.event_time));
        list.truncate(limit);
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarm_state::AlarmState;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 12, 12, 6, minute, 0).unwrap()
    }

    fn event(minute: u32, state: AlarmState) -> TransitionEvent {
        TransitionEvent::new("flaky-service", "1577082070_pipeline5", state, at(minute))
    }

    #[tokio::test]
    async fn test_put_and_last_event() {
        let store = MemoryStore::new();
        assert!(store.last_event("flaky-service").await.unwrap().is_none());

        store.put_event(&event(1, AlarmState::Failing)).await.unwrap();
        store.put_event(&event(5, AlarmState::Healthy)).await.unwrap();

        let last = store.last_event("flaky-service").await.unwrap().unwrap();
        assert_eq!(last.state, AlarmState::Healthy);
        assert_eq!(last.value, -1);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn test_last_event_by_event_time() {
        let store = MemoryStore::new();
        store.put_event(&event(5, AlarmState::Healthy)).await.unwrap();
        // late delivery of an older transition
        store.put_event(&event(1, AlarmState::Failing)).await.unwrap();

        let last = store.last_event("flaky-service").await.unwrap().unwrap();
        assert_eq!(last.event_time, at(5));
    }

    #[tokio::test]
    async fn test_events_newest_first() {
        let store = MemoryStore::new();
        store.put_event(&event(1, AlarmState::Failing)).await.unwrap();
        store.put_event(&event(3, AlarmState::Failing)).await.unwrap();
        store.put_event(&event(2, AlarmState::Healthy)).await.unwrap();

        let events = store.events("flaky-service", 2).await.unwrap();
        let times: Vec<_> = events.iter().map(|e| e.event_time).collect();
        assert_eq!(times, vec![at(3), at(2)]);
    }

    #[tokio::test]
    async fn test_retention_limit() {
        let store = MemoryStore::with_retention(3);
        for minute in 0..10 {
            store.put_event(&event(minute, AlarmState::Failing)).await.unwrap();
        }

        assert_eq!(store.event_count(), 3);
        let last = store.last_event("flaky-service").await.unwrap().unwrap();
        assert_eq!(last.event_time, at(9));

        store.clear();
        assert_eq!(store.event_count(), 0);
    }
}
