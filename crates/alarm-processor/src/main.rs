//! Alarm Processor - Main Entry Point
//!
//! Reads alarm state-change envelopes, one JSON document per line, from
//! stdin. `ALARM_METRICS_CONFIG` may point at a TOML configuration file.

use alarm_processor::{
    init_logging, install_metrics_exporter, run, AlarmNameFilter, AlarmProcessor, ProcessorConfig,
};
use alarm_state::MemoryHistory;
use anyhow::Context;
use event_store::{MemoryStore, SqliteStore, TransitionStore};
use reliability_metrics::RecorderPublisher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("ALARM_METRICS_CONFIG").map(PathBuf::from);
    let config = ProcessorConfig::load(config_path.as_deref()).context("loading configuration")?;
    init_logging(&config.logging)?;

    info!("=== Alarm Processor v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = &config.metrics_listen_addr {
        install_metrics_exporter(addr)?;
        info!("Serving metrics on {}", addr);
    }

    let store: Arc<dyn TransitionStore> = match &config.database_url {
        Some(url) => Arc::new(
            SqliteStore::connect(url, &config.event_table)
                .await
                .with_context(|| format!("opening transition store {}", url))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };

    let filter = AlarmNameFilter::new(config.blacklist_pattern()).context("compiling blacklist pattern")?;
    let history = Arc::new(MemoryHistory::with_capacity(config.history_capacity));
    let publisher = Arc::new(RecorderPublisher::new(config.metric_namespace.clone()));
    let processor = AlarmProcessor::new(filter, history.clone(), store, publisher);

    let summary = run(BufReader::new(tokio::io::stdin()), &processor, &history).await?;
    info!("Done: {:?}", summary);

    Ok(())
}
