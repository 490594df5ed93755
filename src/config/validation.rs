//! Configuration validation.
//!
//! Serde handles syntax and types; this pass checks values that only make
//! sense together (addresses that must parse, keys required by an enabled
//! feature). Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HostConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending key.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a merged configuration.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.agent.advertise_host.trim().is_empty() {
        errors.push(ValidationError::new("agent.advertise_host", "must not be empty"));
    }
    if config.agent.default_max_connections == 0 {
        errors.push(ValidationError::new(
            "agent.default_max_connections",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("`{}` is not a socket address", config.admin.bind_address),
            ));
        }
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new(
                "admin.api_key",
                "required when the admin API is enabled",
            ));
        }
    }

    for (name, table) in &config.services {
        if let Some(listen) = table.get("listen") {
            if !listen.is_str() {
                errors.push(ValidationError::new(
                    format!("services.{name}.listen"),
                    "must be a string",
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
