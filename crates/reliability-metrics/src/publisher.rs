//! Metric publishing
//!
//! [`RecorderPublisher`] hands data points to whatever `metrics` recorder is
//! installed (the runner installs a Prometheus exporter). Without a recorder
//! the calls are no-ops.

use crate::error::PublishError;
use crate::metric::{DurationMetric, ReliabilityMetric};
use async_trait::async_trait;
use metrics::{describe_histogram, histogram, Unit};
use std::sync::Mutex;
use tracing::{debug, info};

/// Metric publish capability
#[async_trait]
pub trait MetricPublisher: Send + Sync {
    /// Emit one data point scoped by the `service` dimension
    async fn publish(&self, metric: &DurationMetric) -> Result<(), PublishError>;
}

/// Publishes through the `metrics` facade
pub struct RecorderPublisher {
    namespace: String,
}

impl RecorderPublisher {
    /// Create a publisher emitting under `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        for metric in ReliabilityMetric::ALL {
            describe_histogram!(
                qualified_name(&namespace, metric.name()),
                Unit::Seconds,
                metric.description()
            );
        }
        info!("Creating metric publisher for namespace {}", namespace);
        Self { namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

fn qualified_name(namespace: &str, metric: &str) -> String {
    if namespace.is_empty() {
        metric.to_string()
    } else {
        format!("{}.{}", namespace, metric)
    }
}

#[async_trait]
impl MetricPublisher for RecorderPublisher {
    async fn publish(&self, metric: &DurationMetric) -> Result<(), PublishError> {
        let name = qualified_name(&self.namespace, &metric.metric_name);
        debug!(
            "Recording {} = {}s for service {} at {}",
            name, metric.seconds, metric.alarm_name, metric.timestamp
        );
        histogram!(name, "service" => metric.alarm_name.clone()).record(metric.seconds as f64);
        Ok(())
    }
}

/// Keeps published data points in memory
#[derive(Default)]
pub struct MemoryPublisher {
    published: Mutex<Vec<DurationMetric>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn published(&self) -> Vec<DurationMetric> {
        self.published.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Data points for one metric name
    pub fn published_for(&self, metric_name: &str) -> Vec<DurationMetric> {
        self.published()
            .into_iter()
            .filter(|m| m.metric_name == metric_name)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut published) = self.published.lock() {
            published.clear();
        }
    }
}

#[async_trait]
impl MetricPublisher for MemoryPublisher {
    async fn publish(&self, metric: &DurationMetric) -> Result<(), PublishError> {
        let mut published = self
            .published
            .lock()
            .map_err(|e| PublishError::Unavailable(format!("Lock error: {}", e)))?;
        published.push(metric.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn metric(name: &str, seconds: u64) -> DurationMetric {
        DurationMetric {
            metric_name: name.to_string(),
            alarm_name: "flaky-service".to_string(),
            timestamp: Utc.with_ymd_and_hms(2019, 11, 18, 7, 3, 51).unwrap(),
            seconds,
        }
    }

    #[tokio::test]
    async fn test_memory_publisher_collects() {
        let publisher = MemoryPublisher::new();
        publisher.publish(&metric("MTTR", 60)).await.unwrap();
        publisher.publish(&metric("MTBF", 120)).await.unwrap();

        assert_eq!(publisher.published().len(), 2);
        assert_eq!(publisher.published_for("MTTR")[0].seconds, 60);

        publisher.clear();
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_recorder_publisher_without_recorder() {
        let publisher = RecorderPublisher::new("Operations");
        assert_eq!(publisher.namespace(), "Operations");
        assert!(publisher.publish(&metric("MTTF", 30)).await.is_ok());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("Operations", "MTTR"), "Operations.MTTR");
        assert_eq!(qualified_name("", "MTTR"), "MTTR");
    }
}
