//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define balancer metrics (requests, latency, worker health, pool sizes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `lb_requests_total` (counter): requests by status and worker
//! - `lb_request_duration_seconds` (histogram): end-to-end latency
//! - `lb_worker_health` (gauge): 1=healthy, 0=unhealthy
//! - `lb_pool_size` (gauge): workers per pool
//! - `lb_scale_events_total` (counter): promotions and demotions

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(status: u16, worker: &str, start: Instant) {
    let status = status.to_string();
    metrics::counter!("lb_requests_total", "status" => status.clone(), "worker" => worker.to_string())
        .increment(1);
    metrics::histogram!("lb_request_duration_seconds", "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_worker_health(worker: &str, healthy: bool) {
    metrics::gauge!("lb_worker_health", "worker" => worker.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_pool_sizes(primary: usize, standby: usize) {
    metrics::gauge!("lb_pool_size", "pool" => "primary").set(primary as f64);
    metrics::gauge!("lb_pool_size", "pool" => "standby").set(standby as f64);
}

pub fn record_scale_event(direction: &'static str) {
    metrics::counter!("lb_scale_events_total", "direction" => direction).increment(1);
}
