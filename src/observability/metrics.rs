//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define harness metrics (requests, spans, span latency)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `trace_requests_total` (counter): call trees handled, by outcome
//! - `trace_spans_finished_total` (counter): finished spans by operation, outcome
//! - `trace_span_duration_seconds` (histogram): span latency by operation
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Labels are operation name and outcome only (bounded cardinality)

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::observability::span::SpanRecord;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished call tree.
pub fn record_request(failed: bool) {
    let outcome = if failed { "error" } else { "ok" };
    counter!("trace_requests_total", "outcome" => outcome).increment(1);
}

/// Record one finished span.
pub fn record_span(record: &SpanRecord) {
    let outcome = if record.error { "error" } else { "ok" };
    counter!(
        "trace_spans_finished_total",
        "operation" => record.name.clone(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("trace_span_duration_seconds", "operation" => record.name.clone())
        .record(record.duration().as_secs_f64());
}
