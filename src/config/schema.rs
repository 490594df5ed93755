//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits and default every field, so an empty file
//! (or no file at all) is a valid configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the service host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Network agent settings.
    pub agent: AgentConfig,

    /// Logging subsystem settings.
    pub logging: LoggingConfig,

    /// Metrics settings.
    pub observability: ObservabilityConfig,

    /// Admin status API settings.
    pub admin: AdminConfig,

    /// Per-service configuration tables, keyed by service name.
    pub services: BTreeMap<String, toml::Table>,
}

/// Network agent configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Node identity on the mesh; generated when unset.
    pub node_id: Option<String>,

    /// Host name or address other nodes reach this node at.
    pub advertise_host: String,

    /// Maximum concurrently registered services (0 = unlimited).
    pub max_services: usize,

    /// Connection limit for service listeners without `MaxConnections`.
    pub default_max_connections: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            advertise_host: "127.0.0.1".to_string(),
            max_services: 0,
            default_max_connections: 1024,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error, off).
    pub level: String,

    /// Extra filter directives, e.g. `"mesh_host::agent=debug"`.
    pub directives: Vec<String>,

    /// Output format.
    pub format: LogFormat,

    /// Emit ANSI colors.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            format: LogFormat::Pretty,
            ansi: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// Admin API bind address.
    pub bind_address: String,

    /// API key for authentication (Bearer token). Required when enabled.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
            api_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.agent.node_id.is_none());
        assert_eq!(config.agent.default_max_connections, 1024);
        assert!(!config.admin.enabled);
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_service_sections() {
        let config: HostConfig = toml::from_str(
            r#"
            [logging]
            format = "json"

            [services.echo]
            listen = "127.0.0.1:9000"

            [services.heartbeat]
            interval_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.services.len(), 2);
        assert_eq!(
            config.services["echo"].get("listen").and_then(|v| v.as_str()),
            Some("127.0.0.1:9000")
        );
    }
}
