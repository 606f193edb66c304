//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): decisions by outcome
//! - `gate_connections_rejected_total` (counter): connection-limit rejections
//! - `gate_blacklist_size` (gauge): blacklist entries, expired-but-unswept included
//! - `gate_country_blocks` (gauge): country block entries
//! - `gate_sweep_removed_total` (counter): entries removed by the sweep, by kind
//!
//! Recording goes through the `metrics` facade and is a no-op until an
//! exporter is installed with [`init_metrics`].

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::admission::{Decision, SweepReport};

/// Install the Prometheus exporter with an HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

pub fn record_decision(decision: Decision) {
    counter!("gate_decisions_total", "outcome" => decision.label()).increment(1);
}

pub fn record_connection_rejected() {
    counter!("gate_connections_rejected_total").increment(1);
}

pub fn record_blacklist_size(size: usize) {
    gauge!("gate_blacklist_size").set(size as f64);
}

pub fn record_country_blocks(size: usize) {
    gauge!("gate_country_blocks").set(size as f64);
}

pub fn record_sweep(report: &SweepReport) {
    let kinds = [
        ("blacklist", report.expired_ips),
        ("country_block", report.expired_countries),
        ("idle_ip", report.idle_ips),
        ("idle_country_window", report.idle_country_windows),
    ];
    for (kind, removed) in kinds {
        if removed > 0 {
            counter!("gate_sweep_removed_total", "kind" => kind).increment(removed as u64);
        }
    }
}
