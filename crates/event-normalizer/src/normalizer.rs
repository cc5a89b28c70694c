//! Notification to transition event

use crate::error::LookupError;
use crate::lookup::PriorStateLookup;
use alarm_state::{AlarmNotification, AlarmState};
use event_store::TransitionEvent;
use tracing::debug;

/// Where a prior state came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorSource {
    /// Last persisted transition
    Store,
    /// Alarm history walk
    History,
}

/// Last meaningful state known for an alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorBoundary {
    pub state: AlarmState,
    /// Correlation key carried onto the next event
    pub resource_id: String,
    pub source: PriorSource,
}

/// Transition event for `notification`, or `None` when nothing changed.
///
/// `INSUFFICIENT_DATA` is never persisted. Without a prior state there is no
/// safe transition value, so nothing is produced either.
pub fn normalize(
    notification: &AlarmNotification,
    prior: Option<&PriorBoundary>,
) -> Option<TransitionEvent> {
    let new_state = notification.new_state.value;
    if !new_state.is_meaningful() {
        return None;
    }

    let prior = prior?;
    if prior.state == new_state {
        return None;
    }

    Some(TransitionEvent::new(
        notification.alarm_name.clone(),
        prior.resource_id.clone(),
        new_state,
        notification.new_state.timestamp,
    ))
}

/// Normalizer bound to a prior state lookup
pub struct Normalizer {
    lookup: Box<dyn PriorStateLookup>,
}

impl Normalizer {
    pub fn new(lookup: Box<dyn PriorStateLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve the prior state and normalize.
    ///
    /// Indeterminate notifications return before any lookup is issued.
    pub async fn normalize(
        &self,
        notification: &AlarmNotification,
    ) -> Result<Option<TransitionEvent>, LookupError> {
        if !notification.new_state.value.is_meaningful() {
            debug!("Ignoring {} state for {}", notification.new_state.value, notification.alarm_name);
            return Ok(None);
        }

        let prior = self.lookup.prior_state(notification).await?;
        match &prior {
            Some(p) => debug!("Prior state of {} is {} ({:?})", notification.alarm_name, p.state, p.source),
            None => debug!("No prior state known for {}", notification.alarm_name),
        }

        Ok(normalize(notification, prior.as_ref()))
    }
}
