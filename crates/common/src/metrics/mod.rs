//! Metrics and observability utilities
//!
//! Prometheus metrics for request traffic and the order workflow.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Pedidos metrics
pub const METRICS_PREFIX: &str = "pedidos";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_signups_total", METRICS_PREFIX),
        Unit::Count,
        "Accounts created, by role"
    );

    describe_counter!(
        format!("{}_orders_total", METRICS_PREFIX),
        Unit::Count,
        "Order lifecycle events (created, edited, deleted, duplicate)"
    );

    describe_counter!(
        format!("{}_items_total", METRICS_PREFIX),
        Unit::Count,
        "Catalog item events (created, edited, deleted)"
    );

    describe_counter!(
        format!("{}_fulfillments_total", METRICS_PREFIX),
        Unit::Count,
        "Orders dispatched, by destination"
    );

    describe_counter!(
        format!("{}_auth_denials_total", METRICS_PREFIX),
        Unit::Count,
        "Requests refused by session or ownership checks"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    route: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, route: &str) -> Self {
        Self {
            start: Instant::now(),
            route: route.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "route" => self.route.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "route" => self.route
        )
        .record(duration);
    }
}

pub fn record_signup(role: &'static str) {
    counter!(format!("{}_signups_total", METRICS_PREFIX), "role" => role).increment(1);
}

pub fn record_order_event(event: &'static str) {
    counter!(format!("{}_orders_total", METRICS_PREFIX), "event" => event).increment(1);
}

pub fn record_item_event(event: &'static str) {
    counter!(format!("{}_items_total", METRICS_PREFIX), "event" => event).increment(1);
}

pub fn record_fulfillment(destination: &'static str) {
    counter!(
        format!("{}_fulfillments_total", METRICS_PREFIX),
        "destination" => destination
    )
    .increment(1);
}

pub fn record_auth_denial(reason: &'static str) {
    counter!(
        format!("{}_auth_denials_total", METRICS_PREFIX),
        "reason" => reason
    )
    .increment(1);
}
