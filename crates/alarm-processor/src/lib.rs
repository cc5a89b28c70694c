//! Alarm Processor
//!
//! Dispatch layer around the reliability core: configuration, logging,
//! alarm-name filtering, and routing of each notification to the MTBF, MTTR
//! and MTTF handlers and to the state-change capture.

mod error;
mod filter;
mod handler;
mod processor;
mod settings;

pub use error::ProcessorError;
pub use filter::AlarmNameFilter;
pub use handler::{MetricHandler, StateChangeCapture};
pub use processor::{run, AlarmProcessor, ProcessReport, RunSummary, SkipReason};
pub use settings::{LoggingConfig, ProcessorConfig, ENV_PREFIX, LEGACY_BLACKLIST_VAR};

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level. Output goes to
/// stderr; stdin/stdout belong to the notification stream.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ProcessorError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ProcessorError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ProcessorError::Logging(e.to_string()))
}

/// Install the Prometheus recorder and its HTTP listener
pub fn install_metrics_exporter(addr: &str) -> Result<(), ProcessorError> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| ProcessorError::Metrics(format!("{}: {}", addr, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ProcessorError::Metrics(e.to_string()))
}
