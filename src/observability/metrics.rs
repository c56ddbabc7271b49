//! Metrics collection and exposition.
//!
//! # Metrics
//! - `framewire_connections_accepted_total` (counter)
//! - `framewire_connections_closed_total` (counter): by outcome
//! - `framewire_active_connections` (gauge)
//! - `framewire_exchanges_total` (counter): completed request/response pairs
//! - `framewire_registry_objects_total` (counter): surrogate IDs issued

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_connection_opened(active: u64) {
    ::metrics::counter!("framewire_connections_accepted_total").increment(1);
    ::metrics::gauge!("framewire_active_connections").set(active as f64);
}

pub fn record_connection_closed(outcome: &'static str, active: u64) {
    ::metrics::counter!("framewire_connections_closed_total", "outcome" => outcome).increment(1);
    ::metrics::gauge!("framewire_active_connections").set(active as f64);
}

pub fn record_exchange() {
    ::metrics::counter!("framewire_exchanges_total").increment(1);
}

pub fn record_object_registered() {
    ::metrics::counter!("framewire_registry_objects_total").increment(1);
}
