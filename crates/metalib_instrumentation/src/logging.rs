//! Subscriber bootstrap for binaries and tests that use the loader.

use tracing_subscriber::{EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, AppConfigError};
use crate::exporters::{ConsoleExporter, JsonlExporter};
use crate::recorder::{MetricExporter, MetricsLayer};

/// Build the metrics layer described by `config`.
pub fn metrics_layer(config: &AppConfig) -> Result<MetricsLayer, AppConfigError> {
    let mut exporters: Vec<Box<dyn MetricExporter>> = Vec::new();
    if let Some(path) = &config.metrics_jsonl_path {
        let exporter = JsonlExporter::new(path).map_err(|source| AppConfigError::MetricsSink {
            path: path.clone(),
            source,
        })?;
        exporters.push(Box::new(exporter));
    }
    if config.enable_console_metrics {
        exporters.push(Box::new(ConsoleExporter::new()));
    }
    Ok(MetricsLayer::new(exporters))
}

/// Install the global subscriber: a level-filtered `fmt` layer plus the metrics layer.
///
/// Metric events bypass the log level so exporters see them even at `warn`.
/// Returns `Ok(false)` if another subscriber was already installed.
pub fn init_tracing(config: &AppConfig) -> Result<bool, AppConfigError> {
    let filter = EnvFilter::default()
        .add_directive(LevelFilter::from_level(config.log_level).into())
        .add_directive("metrics=off".parse()?);

    let installed = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true).with_filter(filter))
        .with(metrics_layer(config)?)
        .try_init()
        .is_ok();
    Ok(installed)
}
