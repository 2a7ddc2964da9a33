//! Metrics collection and exposition.
//!
//! # Metrics
//! - `strata_requests_total` (counter): requests by method, status
//! - `strata_request_duration_seconds` (histogram): pipeline latency
//! - `strata_handler_panics_total` (counter): handlers that panicked
//! - `strata_pool_contexts_created_total` (counter): contexts allocated by pools
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels kept to method and status to bound cardinality

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Record one served request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("strata_requests_total", "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!("strata_request_duration_seconds", "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record a handler panic caught at the dispatch boundary.
pub fn record_panic() {
    counter!("strata_handler_panics_total").increment(1);
}

/// Record a context allocated by a pool (as opposed to reused).
pub fn record_context_created() {
    counter!("strata_pool_contexts_created_total").increment(1);
}

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
