//! Metrics collection and exposition.
//!
//! # Metrics
//! - `query_service_http_requests_total` (counter): requests by method, path, status
//! - `query_service_http_request_duration_seconds` (histogram): latency distribution
//! - `query_service_rule_evaluations_total` (counter): rule outcomes (executed, skipped, failed)
//! - `query_service_rules` (gauge): registered rules
//! - `query_service_spans_exported_total` (counter): spans handed to the exporter
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("query_service_http_requests_total", &labels).increment(1);
    histogram!("query_service_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rule_evaluation(outcome: &'static str) {
    counter!("query_service_rule_evaluations_total", "outcome" => outcome).increment(1);
}

pub fn record_rule_count(count: usize) {
    gauge!("query_service_rules").set(count as f64);
}

pub fn record_spans_exported(count: usize) {
    counter!("query_service_spans_exported_total").increment(count as u64);
}
