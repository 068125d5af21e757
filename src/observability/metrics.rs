//! Drain metrics and exposition.
//!
//! # Metrics
//! - `closer_teardown_total` (counter): teardowns run, by priority and outcome
//! - `closer_teardown_failures_total` (counter): teardowns that failed, panicked
//!   or were cancelled, by priority and kind
//! - `closer_drain_deadline_exceeded_total` (counter): drains aborted on deadline
//! - `closer_tier_duration_seconds` (histogram): time spent per tier
//! - `closer_drain_duration_seconds` (histogram): time from trigger to latch

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::coordinator::Priority;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one teardown callback.
pub fn record_teardown(priority: Priority, outcome: &'static str) {
    counter!(
        "closer_teardown_total",
        "priority" => priority.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a teardown that did not finish cleanly.
pub fn record_failure(priority: Priority, kind: &'static str) {
    counter!(
        "closer_teardown_failures_total",
        "priority" => priority.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record how long a tier took to drain.
pub fn record_tier(priority: Priority, start: Instant) {
    histogram!("closer_tier_duration_seconds", "priority" => priority.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a finished drain.
pub fn record_drain(deadline_exceeded: bool, start: Instant) {
    if deadline_exceeded {
        counter!("closer_drain_deadline_exceeded_total").increment(1);
    }
    histogram!(
        "closer_drain_duration_seconds",
        "outcome" => if deadline_exceeded { "deadline_exceeded" } else { "completed" }
    )
    .record(start.elapsed().as_secs_f64());
}
