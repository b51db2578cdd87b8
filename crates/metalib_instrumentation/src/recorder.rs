//! Routes `metrics` events to exporters, tagged with the library import they
//! were recorded under.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use crate::event::MetricEvent;

/// Name of the span the loader opens around each import.
pub const IMPORT_SPAN: &str = "import_library";

/// Fields of the enclosing `import_library` span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportContext {
    pub key: String,
    pub kind: String,
    pub mode: String,
}

/// A metric event plus the import it belongs to, if any.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedMetricEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportContext>,
    pub event: MetricEvent,
}

/// Sink for enriched metric events.
pub trait MetricExporter: Send + Sync {
    fn export(&self, event: &EnrichedMetricEvent);
}

/// Tracing layer that turns `metrics` target events back into [`MetricEvent`]s.
///
/// Import spans have their fields captured when they open, so every metric
/// emitted inside one (toolchain runs, translation fallbacks, artifact
/// removal) is attributed to the library being imported.
#[derive(Clone)]
pub struct MetricsLayer {
    exporters: Arc<Vec<Box<dyn MetricExporter>>>,
}

impl MetricsLayer {
    pub fn new(exporters: Vec<Box<dyn MetricExporter>>) -> Self {
        Self {
            exporters: Arc::new(exporters),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }
}

impl<S> Layer<S> for MetricsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if self.exporters.is_empty() || attrs.metadata().name() != IMPORT_SPAN {
            return;
        }
        let mut import = ImportContext::default();
        attrs.record(&mut ImportVisitor(&mut import));
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(import);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if event.metadata().target() != "metrics" || self.exporters.is_empty() {
            return;
        }

        let mut visitor = MetricVisitor::default();
        event.record(&mut visitor);
        let Some(json) = visitor.json else {
            return;
        };
        let metric: MetricEvent = match serde_json::from_str(&json) {
            Ok(metric) => metric,
            Err(error) => {
                tracing::error!(target: "instrument", ?error, "failed to deserialize metric event");
                return;
            }
        };

        let import = ctx
            .event_scope(event)
            .and_then(|mut scope| scope.find_map(|span| span.extensions().get::<ImportContext>().cloned()));
        let enriched = EnrichedMetricEvent {
            timestamp: Utc::now(),
            import,
            event: metric,
        };
        for exporter in self.exporters.iter() {
            exporter.export(&enriched);
        }
    }
}

#[derive(Default)]
struct MetricVisitor {
    json: Option<String>,
}

impl Visit for MetricVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "metric" {
            self.json = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "metric" {
            self.json = Some(value.to_owned());
        }
    }
}

struct ImportVisitor<'a>(&'a mut ImportContext);

impl ImportVisitor<'_> {
    fn assign(&mut self, field: &Field, value: String) {
        match field.name() {
            "key" => self.0.key = value,
            "kind" => self.0.kind = value,
            "mode" => self.0.mode = value,
            _ => {}
        }
    }
}

impl Visit for ImportVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.assign(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.assign(field, value.to_owned());
    }
}
