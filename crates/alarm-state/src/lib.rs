//! Alarm State Semantics
//!
//! Shared vocabulary for alarm processing: the three-state alarm model,
//! incoming state-change notifications, and the alarm history records used to
//! reconstruct the last meaningful state of an alarm.

mod error;
mod history;
mod notification;
mod state;

pub use error::{HistoryError, StateError};
pub use history::{
    latest_boundary_with_state, previous_boundary, sort_reverse_chronological, state_records,
    AlarmHistoryItem, AlarmHistorySource, HistoryItemType, HistoryRecord, MemoryHistory,
};
pub use notification::{
    parse_timestamp, AlarmConfiguration, AlarmDetail, AlarmEvent, AlarmNotification,
    StateSnapshot, StateTransition,
};
pub use state::AlarmState;
