//! Prometheus metrics for dashboard-service.
//!
//! Domain counters live in the default `prometheus` registry. HTTP metrics
//! recorded by `service_core` middleware go through the `metrics` facade
//! and are rendered by the Prometheus exporter handle.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Invoice action outcomes by action and outcome.
pub static INVOICE_ACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dashboard_invoice_actions_total",
        "Total number of invoice form actions by outcome",
        &["action", "outcome"] // create|update|delete, redirect|deleted|validation_failure|store_failure|fault
    )
    .expect("Failed to register invoice_actions_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "dashboard_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// View cache revalidations by path.
pub static CACHE_REVALIDATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dashboard_cache_revalidations_total",
        "Total number of view cache revalidations by path",
        &["path"]
    )
    .expect("Failed to register cache_revalidations_total")
});

/// View cache lookups by result.
pub static CACHE_LOOKUPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dashboard_cache_lookups_total",
        "Total number of view cache lookups by result",
        &["result"] // hit, miss
    )
    .expect("Failed to register cache_lookups_total")
});

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already installed; HTTP metrics go to it");
        }
        handle
    });

    Lazy::force(&INVOICE_ACTIONS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&CACHE_REVALIDATIONS_TOTAL);
    Lazy::force(&CACHE_LOOKUPS_TOTAL);
}

pub fn record_action(action: &str, outcome: &str) {
    INVOICE_ACTIONS_TOTAL
        .with_label_values(&[action, outcome])
        .inc();
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    output.push_str(
        &encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default(),
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_counts_are_rendered() {
        init_metrics();
        record_action("create", "redirect");

        let text = get_metrics();
        assert!(text.contains("dashboard_invoice_actions_total"));
    }
}
