//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mesh_service_starts_total` (counter): services launched, by service
//! - `mesh_service_exits_total` (counter): terminal outcomes, by service and outcome
//! - `mesh_services_running` (gauge): services currently inside their entry point
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape endpoint at `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_service_start(service: &str) {
    counter!("mesh_service_starts_total", "service" => service.to_string()).increment(1);
}

pub fn record_service_exit(service: &str, outcome: &'static str) {
    counter!(
        "mesh_service_exits_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Marks a service as running until dropped.
#[derive(Debug)]
pub struct RunningGuard(());

impl RunningGuard {
    pub fn enter() -> Self {
        gauge!("mesh_services_running").increment(1.0);
        Self(())
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        gauge!("mesh_services_running").decrement(1.0);
    }
}
