//! Metrics collection for booking-service.
//!
//! HTTP request metrics come from the shared middleware; this module adds the
//! booking and status-check counters and owns the Prometheus recorder.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Call once at startup.
pub fn init_metrics() -> Result<(), AppError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;

    METRICS_HANDLE.set(handle).map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("metrics recorder already initialized"))
    })
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count a booking submission by outcome (`delivered`, `failed`, `misconfigured`).
pub fn record_booking(outcome: &'static str) {
    counter!("booking_requests_total", "outcome" => outcome).increment(1);
}

/// Count a status-check write, split by whether it reached storage.
pub fn record_status_write(persisted: bool) {
    let persisted = if persisted { "true" } else { "false" };
    counter!("status_checks_written_total", "persisted" => persisted).increment(1);
}
