//! Host-level errors.
//!
//! Every variant except [`HostError::Registry`] is a bootstrap failure: it
//! stops the run before any service starts. Per-service failures never reach
//! this type; they end up in the [`RunSummary`](crate::lifecycle::RunSummary).

use thiserror::Error;

use crate::agent::AgentError;
use crate::config::ConfigError;
use crate::observability::LoggingError;
use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("load config error: {0}")]
    Config(#[from] ConfigError),

    #[error("load logging config error: {0}")]
    Logging(#[from] LoggingError),

    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("create agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("admin server error: {0}")]
    Admin(#[source] std::io::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl HostError {
    /// Name of the stage that failed, for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            HostError::Config(_) => "config",
            HostError::Logging(_) => "logging",
            HostError::Metrics(_) => "metrics",
            HostError::Agent(_) => "agent",
            HostError::Admin(_) => "admin",
            HostError::Registry(_) => "registry",
        }
    }

    /// Process exit status for a host that stops on this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            HostError::Registry(e) => e.exit_code(),
            _ => 1,
        }
    }
}
