//! Prometheus metrics for request and store monitoring.
//!
//! This module provides metrics for:
//! - Requests handled per endpoint
//! - Products created
//! - Failed requests by error class
//! - Store operation latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Store operation latency metric name.
pub const METRIC_STORE_LATENCY: &str = "store_operation_latency_ms";
/// Requests handled counter metric name.
pub const METRIC_REQUESTS: &str = "http_requests_total";
/// Products created counter metric name.
pub const METRIC_PRODUCTS_CREATED: &str = "products_created_total";
/// Failed requests counter metric name.
pub const METRIC_REQUEST_ERRORS: &str = "http_request_errors_total";

/// Install the Prometheus recorder and return the handle used to render it.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_STORE_LATENCY,
        "Product store operation latency in milliseconds"
    );

    describe_counter!(METRIC_REQUESTS, "Total number of product requests handled");
    describe_counter!(METRIC_PRODUCTS_CREATED, "Total number of products created");
    describe_counter!(
        METRIC_REQUEST_ERRORS,
        "Total number of product requests that failed, by error class"
    );

    debug!("Metrics initialized");
}

/// Increment the request counter for an endpoint.
pub fn inc_requests(endpoint: &'static str) {
    counter!(METRIC_REQUESTS, "endpoint" => endpoint).increment(1);
}

/// Add to the created products counter.
pub fn add_products_created(count: usize) {
    counter!(METRIC_PRODUCTS_CREATED).increment(count as u64);
}

/// Increment the failed request counter for an error class.
pub fn inc_request_errors(class: &'static str) {
    counter!(METRIC_REQUEST_ERRORS, "class" => class).increment(1);
}

/// RAII guard for timing store operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    operation: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given store operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(METRIC_STORE_LATENCY, "operation" => self.operation).record(self.elapsed_ms());
    }
}

/// Create a latency timer for a store operation.
pub fn timer_store(operation: &'static str) -> LatencyTimer {
    LatencyTimer::new(operation)
}
