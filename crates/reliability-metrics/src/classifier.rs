//! Transition Classifier
//!
//! Decides whether a notification completes a transition of interest and how
//! long the alarm spent since it last entered the complementary state.
//!
//! Only history strictly before the notification's transition instant is
//! consulted, so the answer does not depend on whether the history read
//! already contains the notification's own entry.

use alarm_state::{latest_boundary_with_state, previous_boundary, AlarmNotification, AlarmState, HistoryRecord};
use chrono::{DateTime, Utc};

/// Pair of states a metric measures between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTarget {
    /// State the notification must enter
    pub new_state: AlarmState,
    /// State whose latest entry starts the clock
    pub old_state: AlarmState,
}

impl TransitionTarget {
    pub const fn new(new_state: AlarmState, old_state: AlarmState) -> Self {
        Self { new_state, old_state }
    }

    /// Relevance check; the notification's own previous state is not used
    pub fn matches(&self, notification: &AlarmNotification) -> bool {
        notification.new_state.value == self.new_state
    }
}

/// Whether the alarm's meaningful value flipped with this notification.
///
/// False when the notification reports the same state on both sides, or when
/// the nearest earlier boundary already holds the new state, which covers
/// retried deliveries and `OK -> INSUFFICIENT_DATA -> OK` flaps. An alarm with
/// no earlier boundary counts as changed.
pub fn has_state_changed(notification: &AlarmNotification, history: &[HistoryRecord]) -> bool {
    let new_state = notification.new_state.value;
    if !new_state.is_meaningful() || notification.is_no_op() {
        return false;
    }

    match previous_boundary(history, notification.transition_instant()) {
        Some(boundary) => boundary.new_state != new_state,
        None => true,
    }
}

/// Whole seconds from `from` to `to`, clamped at zero
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}

/// Seconds since the alarm last entered `target.old_state`, or `None` when
/// the notification does not qualify.
///
/// `history` must be newest first. Without an earlier `old_state` boundary
/// the duration is zero.
pub fn compute_duration(
    notification: &AlarmNotification,
    target: TransitionTarget,
    history: &[HistoryRecord],
) -> Option<u64> {
    if !target.matches(notification) {
        return None;
    }

    if !has_state_changed(notification, history) {
        return None;
    }

    let seconds = latest_boundary_with_state(history, notification.transition_instant(), target.old_state)
        .map(|boundary| elapsed_seconds(boundary.timestamp, notification.event_time))
        .unwrap_or(0);

    Some(seconds)
}
