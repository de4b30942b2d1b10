//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_locators_discovered_total` (counter): locators emitted by the watcher
//! - `relay_cursor_block` (gauge): last fully processed block
//! - `relay_resolutions_total` (counter): resolutions by result
//! - `relay_queue_depth` (gauge): transactions waiting in the priority queue
//! - `relay_transactions_total` (counter): relay attempts by outcome
//! - `relay_rpc_health` (gauge): 1=healthy, 0=unhealthy

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_locator_discovered() {
    metrics::counter!("relay_locators_discovered_total").increment(1);
}

pub fn record_cursor(block: u64) {
    metrics::gauge!("relay_cursor_block").set(block as f64);
}

pub fn record_resolution(result: &'static str) {
    metrics::counter!("relay_resolutions_total", "result" => result).increment(1);
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("relay_queue_depth").set(depth as f64);
}

pub fn record_relay_outcome(outcome: &'static str) {
    metrics::counter!("relay_transactions_total", "outcome" => outcome).increment(1);
}

pub fn record_rpc_health(healthy: bool) {
    metrics::gauge!("relay_rpc_health").set(if healthy { 1.0 } else { 0.0 });
}
