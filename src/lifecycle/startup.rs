//! Startup: configuration, logging, metrics, agent.
//!
//! # Design Decisions
//! - Fail fast: any error here is fatal to the run, no service starts
//! - Stages run in order; logging comes up before anything else is built

use std::sync::Arc;

use crate::agent::{Agent, AgentError, LocalAgent};
use crate::cli::Cli;
use crate::config::{ConfigLoader, HostConfig};
use crate::error::HostError;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

/// Builds the agent from the merged configuration.
pub type AgentFactory =
    dyn Fn(&HostConfig, &Shutdown) -> Result<Arc<dyn Agent>, AgentError> + Send + Sync;

/// The agent factory used by default: a [`LocalAgent`].
pub fn local_agent(config: &HostConfig, shutdown: &Shutdown) -> Result<Arc<dyn Agent>, AgentError> {
    Ok(Arc::new(LocalAgent::new(config, shutdown)?))
}

/// Everything orchestration needs from startup.
pub struct Bootstrap {
    pub config: HostConfig,
    pub agent: Arc<dyn Agent>,
    pub shutdown: Shutdown,
}

/// Run every startup stage.
pub fn bootstrap<I>(cli: &Cli, env: I, agent_factory: &AgentFactory) -> Result<Bootstrap, HostError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut loader = ConfigLoader::new()
        .with_env(env)
        .with_overrides(cli.overrides.iter().cloned());
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let config = loader.load()?;

    logging::init_logging(&config.logging)?;

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let shutdown = Shutdown::new();
    let agent = agent_factory(&config, &shutdown)?;

    tracing::info!(
        node_id = %agent.network().id(),
        config_file = ?cli.config,
        "Bootstrap complete"
    );

    Ok(Bootstrap {
        config,
        agent,
        shutdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(overrides: &[(&str, &str)]) -> Cli {
        Cli {
            config: None,
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_bootstrap_defaults() {
        let boot = bootstrap(&cli(&[]), Vec::new(), &local_agent).unwrap();
        assert!(boot.agent.network().id().starts_with("mesh-"));
        assert_eq!(boot.config.logging.level, "info");
    }

    #[test]
    fn test_flag_beats_env_through_bootstrap() {
        let env = vec![("MESH_AGENT__NODE_ID".to_string(), "from-env".to_string())];
        let boot = bootstrap(&cli(&[("agent.node_id", "from-flag")]), env, &local_agent).unwrap();
        assert_eq!(boot.agent.network().id(), "from-flag");
    }

    #[test]
    fn test_logging_failure_is_fatal() {
        let err = bootstrap(&cli(&[("logging.level", "verbose")]), Vec::new(), &local_agent)
            .err()
            .unwrap();
        assert_eq!(err.stage(), "logging");
    }

    #[test]
    fn test_agent_failure_is_fatal() {
        let err = bootstrap(&cli(&[("agent.node_id", "bad id")]), Vec::new(), &local_agent)
            .err()
            .unwrap();
        assert_eq!(err.stage(), "agent");
    }
}
