//! Periodic liveness log line.

use std::time::Duration;

use serde::Deserialize;

use crate::registry::ServiceDescriptor;
use crate::service::{ServiceContext, ServiceError};

pub const NAME: &str = "heartbeat";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeartbeatSettings {
    /// Milliseconds between beats.
    pub interval_ms: u64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self { interval_ms: 30_000 }
    }
}

pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(NAME, run)
}

/// Log a beat every `interval_ms` until shutdown.
pub async fn run(mut ctx: ServiceContext) -> Result<(), ServiceError> {
    let settings: HeartbeatSettings = ctx.settings()?;
    if settings.interval_ms == 0 {
        return Err(ServiceError::Settings("interval_ms must be greater than zero".into()));
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(settings.interval_ms));
    let mut beats: u64 = 0;
    let node_id = ctx.node_id().to_string();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                beats += 1;
                tracing::info!(node_id = %node_id, beats, "Heartbeat");
            }
            _ = ctx.shutdown_signal() => {
                tracing::info!(beats, "Heartbeat stopping");
                return Ok(());
            }
        }
    }
}
