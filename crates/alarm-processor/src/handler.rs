//! Per-notification handlers
//!
//! Each handler owns one output. Failures of the external capabilities stop
//! that handler for this notification only: they are logged and reported as
//! "nothing produced".

use crate::error::ProcessorError;
use alarm_state::{AlarmHistorySource, AlarmNotification};
use event_normalizer::{FallbackLookup, Normalizer};
use event_store::{TransitionEvent, TransitionStore};
use reliability_metrics::{compute_duration, DurationMetric, MetricPublisher, ReliabilityMetric};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Computes and publishes one reliability metric
pub struct MetricHandler {
    metric: ReliabilityMetric,
    history: Arc<dyn AlarmHistorySource>,
    publisher: Arc<dyn MetricPublisher>,
}

impl MetricHandler {
    pub fn new(
        metric: ReliabilityMetric,
        history: Arc<dyn AlarmHistorySource>,
        publisher: Arc<dyn MetricPublisher>,
    ) -> Self {
        Self {
            metric,
            history,
            publisher,
        }
    }

    pub fn metric(&self) -> ReliabilityMetric {
        self.metric
    }

    /// Published data point, if the notification produced one
    pub async fn handle(&self, notification: &AlarmNotification) -> Option<DurationMetric> {
        match self.try_handle(notification).await {
            Ok(metric) => metric,
            Err(e) => {
                warn!(
                    "Failed to generate {} for {}: {}",
                    self.metric, notification.alarm_name, e
                );
                None
            }
        }
    }

    async fn try_handle(
        &self,
        notification: &AlarmNotification,
    ) -> Result<Option<DurationMetric>, ProcessorError> {
        let target = self.metric.target();
        if !target.matches(notification) {
            debug!(
                "{}: state {} not matched for {}, ignoring",
                self.metric, notification.new_state.value, notification.alarm_name
            );
            return Ok(None);
        }

        let history = self.history.state_history(&notification.alarm_name).await?;
        let Some(seconds) = compute_duration(notification, target, &history) else {
            debug!("{}: no state change for {}", self.metric, notification.alarm_name);
            return Ok(None);
        };

        let metric = DurationMetric::for_notification(self.metric, notification, seconds);
        info!("Publishing {} for {}: {}s", self.metric, metric.alarm_name, seconds);
        self.publisher.publish(&metric).await?;
        Ok(Some(metric))
    }
}

/// Normalizes notifications and persists real transitions
pub struct StateChangeCapture {
    normalizer: Normalizer,
    store: Arc<dyn TransitionStore>,
}

impl StateChangeCapture {
    pub fn new(normalizer: Normalizer, store: Arc<dyn TransitionStore>) -> Self {
        Self { normalizer, store }
    }

    /// Capture backed by the store with a history-walk fallback
    pub fn with_fallback(
        store: Arc<dyn TransitionStore>,
        history: Arc<dyn AlarmHistorySource>,
    ) -> Self {
        let lookup = FallbackLookup::store_then_history(Arc::clone(&store), history);
        Self::new(Normalizer::new(Box::new(lookup)), store)
    }

    /// Persisted event, if the notification was a real transition
    pub async fn handle(&self, notification: &AlarmNotification) -> Option<TransitionEvent> {
        match self.try_handle(notification).await {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to capture state change for {}: {}", notification.alarm_name, e);
                None
            }
        }
    }

    async fn try_handle(
        &self,
        notification: &AlarmNotification,
    ) -> Result<Option<TransitionEvent>, ProcessorError> {
        let Some(event) = self.normalizer.normalize(notification).await? else {
            debug!("No transition to store for {}", notification.alarm_name);
            return Ok(None);
        };

        self.store.put_event(&event).await?;
        info!(
            "Stored transition {} ({:+}) for {} at {}",
            event.state, event.value, event.id, event.event_time
        );
        Ok(Some(event))
    }
}
