//! Convenience re-exports for instrumentation consumers.

pub use crate::config::{AppConfig, AppConfigError};
pub use crate::event::MetricEvent;
pub use crate::exporters::{ChannelExporter, ConsoleExporter, JsonlExporter};
pub use crate::logging::{init_tracing, metrics_layer};
pub use crate::record_metric;
pub use crate::recorder::{EnrichedMetricEvent, IMPORT_SPAN, ImportContext, MetricExporter, MetricsLayer};

pub use metalib_env::{EnvVarError, Environment, InstrumentEnvVar};

pub use chrono::{DateTime, Utc};
pub use serde_json;
pub use tracing::{Level, info, info_span, subscriber};
pub use tracing_subscriber::{self, layer::SubscriberExt};
