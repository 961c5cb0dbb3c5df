//! Metrics collection and exposition.
//!
//! # Metrics
//! - `admission_decisions_total` (counter): outcome per request
//! - `admission_in_flight` (gauge): held concurrency permits
//! - `admission_tracked_clients` (gauge): client keys held by the limiter
//! - `upstream_requests_total` (counter): forwarded requests by status
//! - `upstream_request_duration_seconds` (histogram): upstream latency
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Count an admission outcome: `passthrough`, `admitted`, `rate_limited`
/// or `capacity_exceeded`.
pub fn record_decision(outcome: &'static str) {
    metrics::counter!("admission_decisions_total", "outcome" => outcome).increment(1);
}

pub fn in_flight_acquired() {
    metrics::gauge!("admission_in_flight").increment(1.0);
}

pub fn in_flight_released() {
    metrics::gauge!("admission_in_flight").decrement(1.0);
}

pub fn set_tracked_clients(count: usize) {
    metrics::gauge!("admission_tracked_clients").set(count as f64);
}

/// Record a forwarded request. `status` is 502 for transport failures.
pub fn record_upstream(status: u16, start: Instant) {
    metrics::counter!("upstream_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("upstream_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
