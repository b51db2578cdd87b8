//! Metrics and logging plumbing for the metalib loader.
//!
//! Metric events are ordinary `tracing` events on the `metrics` target. The
//! [`MetricsLayer`] picks them up, tags them with the import they were recorded
//! under and fans them out to the configured [`MetricExporter`]s.

pub mod config;
pub mod event;
pub mod exporters;
pub mod logging;
pub mod macros;
pub mod prelude;
pub mod recorder;

pub use config::{AppConfig, AppConfigError};
pub use event::MetricEvent;
pub use exporters::{ChannelExporter, ConsoleExporter, JsonlExporter};
pub use recorder::{EnrichedMetricEvent, IMPORT_SPAN, ImportContext, MetricExporter, MetricsLayer};

#[doc(hidden)]
pub use serde_json as __serde_json;
