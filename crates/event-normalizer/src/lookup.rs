//! Prior state lookup chain
//!
//! The persisted last event is the fast path. When the store has nothing for
//! an alarm (first run, pruned data) the alarm history is walked instead.

use crate::error::LookupError;
use crate::normalizer::{PriorBoundary, PriorSource};
use alarm_state::{previous_boundary, AlarmHistorySource, AlarmNotification};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_store::TransitionStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the last meaningful state of an alarm
#[async_trait]
pub trait PriorStateLookup: Send + Sync {
    async fn prior_state(
        &self,
        notification: &AlarmNotification,
    ) -> Result<Option<PriorBoundary>, LookupError>;
}

/// Reads the last persisted transition
pub struct StoreLookup {
    store: Arc<dyn TransitionStore>,
}

impl StoreLookup {
    pub fn new(store: Arc<dyn TransitionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PriorStateLookup for StoreLookup {
    async fn prior_state(
        &self,
        notification: &AlarmNotification,
    ) -> Result<Option<PriorBoundary>, LookupError> {
        let last = self.store.last_event(&notification.alarm_name).await?;
        Ok(last
            .filter(|event| event.state.is_meaningful())
            .map(|event| PriorBoundary {
                state: event.state,
                resource_id: event.resource_id,
                source: PriorSource::Store,
            }))
    }
}

/// Correlation key for a boundary found in history
pub fn derive_resource_id(alarm_name: &str, boundary: DateTime<Utc>) -> String {
    format!("{}_{}", boundary.timestamp(), alarm_name)
}

/// Walks the alarm history for the nearest meaningful boundary
pub struct HistoryLookup {
    history: Arc<dyn AlarmHistorySource>,
}

impl HistoryLookup {
    pub fn new(history: Arc<dyn AlarmHistorySource>) -> Self {
        Self { history }
    }
}

#[async_trait]
impl PriorStateLookup for HistoryLookup {
    async fn prior_state(
        &self,
        notification: &AlarmNotification,
    ) -> Result<Option<PriorBoundary>, LookupError> {
        let records = self.history.state_history(&notification.alarm_name).await?;
        Ok(
            previous_boundary(&records, notification.transition_instant()).map(|boundary| {
                PriorBoundary {
                    state: boundary.new_state,
                    resource_id: derive_resource_id(&notification.alarm_name, boundary.timestamp),
                    source: PriorSource::History,
                }
            }),
        )
    }
}

/// Tries `primary`, then `fallback` when it has nothing or fails
pub struct FallbackLookup {
    primary: Box<dyn PriorStateLookup>,
    fallback: Box<dyn PriorStateLookup>,
}

impl FallbackLookup {
    pub fn new(primary: Box<dyn PriorStateLookup>, fallback: Box<dyn PriorStateLookup>) -> Self {
        Self { primary, fallback }
    }

    /// Store first, history second
    pub fn store_then_history(
        store: Arc<dyn TransitionStore>,
        history: Arc<dyn AlarmHistorySource>,
    ) -> Self {
        Self::new(
            Box::new(StoreLookup::new(store)),
            Box::new(HistoryLookup::new(history)),
        )
    }
}

#[async_trait]
impl PriorStateLookup for FallbackLookup {
    async fn prior_state(
        &self,
        notification: &AlarmNotification,
    ) -> Result<Option<PriorBoundary>, LookupError> {
        match self.primary.prior_state(notification).await {
            Ok(Some(prior)) => return Ok(Some(prior)),
            Ok(None) => debug!("No stored state for {}, walking history", notification.alarm_name),
            Err(e) => warn!(
                "Stored state unavailable for {}: {}; walking history",
                notification.alarm_name, e
            ),
        }
        self.fallback.prior_state(notification).await
    }
}
