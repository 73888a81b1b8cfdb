//! Prometheus metrics for playbook-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const MUTATIONS_TOTAL: &str = "playbook_mutations_total";
const EXPORTS_TOTAL: &str = "playbook_exports_total";
const EXPORT_DURATION: &str = "playbook_export_duration_seconds";
const WIDGET_ITEMS: &str = "playbook_widget_items";
const VALIDATION_FAILURES_TOTAL: &str = "playbook_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a widget mutation.
///
/// * `op` - "update", "add" or "remove"
/// * `outcome` - "applied", "unchanged" or "rejected"
pub fn record_mutation(op: &str, outcome: &str) {
    counter!(
        MUTATIONS_TOTAL,
        "op" => op.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record an export attempt and how long it took.
pub fn record_export(format: &str, success: bool, duration_secs: f64) {
    counter!(
        EXPORTS_TOTAL,
        "format" => format.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
    histogram!(EXPORT_DURATION, "format" => format.to_string()).record(duration_secs);
}

/// Update the item count of a widget.
#[allow(clippy::cast_precision_loss)]
pub fn set_widget_items(widget_id: &str, count: usize) {
    gauge!(WIDGET_ITEMS, "widget" => widget_id.to_string()).set(count as f64);
}

/// Record an input validation failure.
///
/// * `validation_type` - what failed (widget_id, collection, item_id, patch)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}
