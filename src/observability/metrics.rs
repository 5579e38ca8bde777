//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_decisions_total` (counter): decisions by outcome and reason
//! - `router_sessions_issued_total` (counter): new session cookies
//! - `router_upstream_requests_total` (counter): upstream calls by status
//! - `router_upstream_duration_seconds` (histogram): upstream latency
//! - `router_request_duration_seconds` (histogram): end-to-end latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Decision;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_decision(decision: &Decision) {
    metrics::counter!(
        "router_decisions_total",
        "outcome" => decision.outcome(),
        "reason" => decision.reason().as_str()
    )
    .increment(1);
}

pub fn record_session_issued() {
    metrics::counter!("router_sessions_issued_total").increment(1);
}

pub fn record_upstream(status: u16, start: Instant) {
    metrics::counter!("router_upstream_requests_total", "status" => status.to_string())
        .increment(1);
    metrics::histogram!("router_upstream_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_duration(start: Instant) {
    metrics::histogram!("router_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
