//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): gate outcomes by label
//! - `gate_rate_limited_total` (counter): requests denied by the rate limiter
//! - `gate_upstream_requests_total` (counter): forwarded requests by upstream status
//! - `gate_request_duration_seconds` (histogram): upstream round trip, from dispatch
//!   to response headers
//!
//! # Design Decisions
//! - Uses the `metrics` facade; recording is a no-op until an exporter is installed
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(outcome: &'static str) {
    counter!("gate_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited() {
    counter!("gate_rate_limited_total").increment(1);
}

/// `start` is taken when the proxy handler begins forwarding.
pub fn record_upstream(status: u16, start: Instant) {
    counter!("gate_upstream_requests_total", "status" => status.to_string()).increment(1);
    histogram!("gate_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
