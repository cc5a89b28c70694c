//! Notification dispatch

use crate::filter::AlarmNameFilter;
use crate::handler::{MetricHandler, StateChangeCapture};
use alarm_state::{AlarmEvent, AlarmHistorySource, AlarmNotification, MemoryHistory};
use event_store::{TransitionEvent, TransitionStore};
use reliability_metrics::{DurationMetric, MetricPublisher, ReliabilityMetric};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Why a notification produced nothing at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Payload could not be interpreted
    Malformed,
    /// Alarm name matched the blacklist
    Filtered,
}

/// What one notification produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    pub metrics: Vec<DurationMetric>,
    pub event: Option<TransitionEvent>,
    pub skipped: Option<SkipReason>,
}

impl ProcessReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.event.is_none()
    }
}

/// Routes notifications to the metric handlers and the state-change capture
pub struct AlarmProcessor {
    filter: AlarmNameFilter,
    mtbf: MetricHandler,
    mttr: MetricHandler,
    mttf: MetricHandler,
    capture: StateChangeCapture,
}

impl AlarmProcessor {
    pub fn new(
        filter: AlarmNameFilter,
        history: Arc<dyn AlarmHistorySource>,
        store: Arc<dyn TransitionStore>,
        publisher: Arc<dyn MetricPublisher>,
    ) -> Self {
        let handler = |metric| MetricHandler::new(metric, Arc::clone(&history), Arc::clone(&publisher));
        Self {
            filter,
            mtbf: handler(ReliabilityMetric::MeanTimeBetweenFailures),
            mttr: handler(ReliabilityMetric::MeanTimeToRecovery),
            mttf: handler(ReliabilityMetric::MeanTimeToFailure),
            capture: StateChangeCapture::with_fallback(store, Arc::clone(&history)),
        }
    }

    /// Process an inbound envelope
    pub async fn process(&self, event: &AlarmEvent) -> ProcessReport {
        match AlarmNotification::try_from(event) {
            Ok(notification) => self.process_notification(&notification).await,
            Err(e) => {
                debug!("Ignoring notification {}: {}", event.id, e);
                ProcessReport::skipped(SkipReason::Malformed)
            }
        }
    }

    /// Process a typed notification.
    ///
    /// The metric handlers and the capture run concurrently; each reads its
    /// own view of history and store.
    pub async fn process_notification(&self, notification: &AlarmNotification) -> ProcessReport {
        if !self.filter.allows(&notification.alarm_name) {
            debug!("Alarm {} is blacklisted, ignoring", notification.alarm_name);
            return ProcessReport::skipped(SkipReason::Filtered);
        }

        let (mtbf, mttr, mttf, event) = tokio::join!(
            self.mtbf.handle(notification),
            self.mttr.handle(notification),
            self.mttf.handle(notification),
            self.capture.handle(notification),
        );

        ProcessReport {
            metrics: [mtbf, mttr, mttf].into_iter().flatten().collect(),
            event,
            skipped: None,
        }
    }
}

/// Totals of a [`run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub received: usize,
    pub malformed: usize,
    pub filtered: usize,
    /// Redeliveries of an already recorded state update
    pub duplicates: usize,
    pub metrics_published: usize,
    pub events_stored: usize,
}

/// Process one JSON envelope per line until `reader` is exhausted.
///
/// Every readable notification is appended to `history` before dispatch, so
/// the in-process history mirrors what an external history source would hold.
/// A notification whose state update is already in `history` is a redelivery
/// and is dropped without dispatch.
pub async fn run<R>(
    reader: R,
    processor: &AlarmProcessor,
    history: &MemoryHistory,
) -> std::io::Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = RunSummary::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.received += 1;

        let event = match AlarmEvent::from_json(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping unreadable notification: {}", e);
                summary.malformed += 1;
                continue;
            }
        };

        if let Ok(notification) = AlarmNotification::try_from(&event) {
            match history.record_notification(&notification) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        "Dropping redelivered {} notification for {} at {}",
                        notification.new_state.value,
                        notification.alarm_name,
                        notification.transition_instant()
                    );
                    summary.duplicates += 1;
                    continue;
                }
                Err(e) => warn!("Failed to record history for {}: {}", notification.alarm_name, e),
            }
        }

        let report = processor.process(&event).await;
        match report.skipped {
            Some(SkipReason::Malformed) => summary.malformed += 1,
            Some(SkipReason::Filtered) => summary.filtered += 1,
            None => {}
        }
        summary.metrics_published += report.metrics.len();
        summary.events_stored += usize::from(report.event.is_some());
    }

    info!(
        "Processed {} notifications: {} metrics, {} events, {} filtered, {} malformed, {} duplicates",
        summary.received,
        summary.metrics_published,
        summary.events_stored,
        summary.filtered,
        summary.malformed,
        summary.duplicates
    );
    Ok(summary)
}
