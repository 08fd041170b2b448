//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): responses by route and status
//! - `gateway_request_duration_seconds` (histogram): handler latency by route
//! - `gateway_rejections_total` (counter): ingestion rejections by route and reason
//! - `gateway_rate_limited_total` (counter): rate limit rejections by route
//! - `gateway_rate_limit_keys` (gauge): windows held by the rate limiter

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, started: Instant) {
    counter!("gateway_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_rejection(route: &'static str, reason: &'static str) {
    counter!("gateway_rejections_total", "route" => route, "reason" => reason).increment(1);
}

pub fn record_rate_limited(route: &'static str) {
    counter!("gateway_rate_limited_total", "route" => route).increment(1);
}

pub fn record_rate_limit_keys(count: usize) {
    gauge!("gateway_rate_limit_keys").set(count as f64);
}
