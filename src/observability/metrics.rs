//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_admitted_total` (counter): requests that passed the rate gate
//! - `gate_rejections_total` (counter): denials by error kind
//! - `gate_rate_limit_entries` (gauge): live token buckets
//! - `gate_rate_limit_evictions_total` (counter): idle buckets dropped
//! - `gate_captcha_issued_total` (counter)
//! - `gate_captcha_verifications_total` (counter): by outcome
//! - `gate_captcha_entries` (gauge): live challenges
//! - `gate_permission_load_seconds` (histogram): collaborator latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admitted() {
    counter!("gate_requests_admitted_total").increment(1);
}

pub fn record_rejection(kind: &'static str) {
    counter!("gate_rejections_total", "kind" => kind).increment(1);
}

pub fn record_rate_limit_entries(count: usize) {
    gauge!("gate_rate_limit_entries").set(count as f64);
}

pub fn record_evictions(count: usize) {
    counter!("gate_rate_limit_evictions_total").increment(count as u64);
}

pub fn record_captcha_issued(live_entries: usize) {
    counter!("gate_captcha_issued_total").increment(1);
    gauge!("gate_captcha_entries").set(live_entries as f64);
}

pub fn record_captcha_verification(outcome: &'static str, live_entries: usize) {
    counter!("gate_captcha_verifications_total", "outcome" => outcome).increment(1);
    gauge!("gate_captcha_entries").set(live_entries as f64);
}

pub fn record_permission_load(start: Instant) {
    histogram!("gate_permission_load_seconds").record(start.elapsed().as_secs_f64());
}
