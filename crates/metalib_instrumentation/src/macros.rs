//! Developer-facing macros for emitting structured metric events.

/// Emit a [`MetricEvent`](crate::MetricEvent) on the `metrics` tracing target.
///
/// The event is serialised to JSON so it survives the trip through `tracing`'s
/// field visitors; [`MetricsLayer`](crate::MetricsLayer) restores it on the other side.
#[macro_export]
macro_rules! record_metric {
    ($event:expr) => {{
        if let Ok(__metric_json) = $crate::__serde_json::to_string(&$event) {
            tracing::event!(
                target: "metrics",
                tracing::Level::INFO,
                metric = %__metric_json
            );
        }
    }};
}
