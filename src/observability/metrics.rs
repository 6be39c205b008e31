//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (event deliveries, bootstrap timing, listener state)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `app_event_deliveries_total` (counter): handler invocations by event, subscriber, outcome
//! - `app_bootstrap_phase_seconds` (histogram): duration of each bootstrap phase
//! - `app_listener_running` (gauge): 1=running, 0=stopped
//! - `app_rate_limited_total` (counter): requests rejected by the idempotency guard
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Labels are low-cardinality names, never user input

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
        )?
        .install()?;

    describe_counter!(
        "app_event_deliveries_total",
        "Event handler invocations by outcome"
    );
    describe_histogram!(
        "app_bootstrap_phase_seconds",
        "Time spent in each bootstrap phase"
    );
    describe_gauge!("app_listener_running", "Whether the HTTP listener is serving");
    describe_counter!(
        "app_rate_limited_total",
        "Requests rejected by the idempotency guard"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_event_delivery(event: &'static str, subscriber: &str, success: bool) {
    let outcome = if success { "delivered" } else { "failed" };
    counter!(
        "app_event_deliveries_total",
        "event" => event,
        "subscriber" => subscriber.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_bootstrap_phase(phase: &'static str, elapsed: Duration) {
    histogram!("app_bootstrap_phase_seconds", "phase" => phase).record(elapsed.as_secs_f64());
}

pub fn record_listener_state(running: bool) {
    gauge!("app_listener_running").set(if running { 1.0 } else { 0.0 });
}

pub fn record_rate_limited(route: &str) {
    counter!("app_rate_limited_total", "route" => route.to_string()).increment(1);
}
