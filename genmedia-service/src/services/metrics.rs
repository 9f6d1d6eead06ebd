//! Prometheus export plus the domain counters the handlers record.

use crate::models::MediaKind;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Call once from `main`, before serving.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    describe_counter!("artifacts_stored_total", "Artifacts persisted, by media kind");
    describe_counter!(
        "artifacts_filtered_total",
        "Artifacts dropped by provider content filtering"
    );
    describe_counter!(
        "artifact_store_failures_total",
        "Blob backend faults, by operation"
    );
    describe_counter!(
        "provider_requests_total",
        "Provider calls, by request kind and outcome"
    );
}

/// Prometheus text for `/metrics`.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_filtered(kind: MediaKind) {
    counter!("artifacts_filtered_total", "media" => kind.as_str()).increment(1);
}

pub fn record_provider_request(kind: &'static str, outcome: &'static str) {
    counter!("provider_requests_total", "kind" => kind, "outcome" => outcome).increment(1);
}
