//! Reliability Metrics
//!
//! Derives MTBF, MTTR and MTTF durations from alarm state transitions and
//! publishes them to a metrics sink.

mod classifier;
mod error;
mod metric;
mod publisher;

pub use classifier::{compute_duration, elapsed_seconds, has_state_changed, TransitionTarget};
pub use error::PublishError;
pub use metric::{DurationMetric, ReliabilityMetric};
pub use publisher::{MemoryPublisher, MetricPublisher, RecorderPublisher};
