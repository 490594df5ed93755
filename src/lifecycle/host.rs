//! The host: bootstrap, then orchestrate.

use std::sync::Arc;

use clap::Parser;

use crate::admin::{self, AdminState};
use crate::agent::{Agent, AgentError};
use crate::cli::Cli;
use crate::config::HostConfig;
use crate::error::HostError;
use crate::lifecycle::orchestrator::{Orchestrator, RunSummary};
use crate::lifecycle::startup::{self, AgentFactory};
use crate::lifecycle::status::ServiceBoard;
use crate::lifecycle::{signals, Shutdown};
use crate::registry::{self, ServiceDescriptor, ServiceRegistry};

/// Runs the services of one registry inside this process.
pub struct Host {
    registry: Arc<ServiceRegistry>,
    agent_factory: Arc<AgentFactory>,
}

impl Host {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self {
            registry,
            agent_factory: Arc::new(startup::local_agent),
        }
    }

    /// Host over the process-wide registry.
    pub fn global() -> Self {
        Self::new(registry::global().clone())
    }

    /// Replace the agent built at bootstrap.
    pub fn with_agent_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&HostConfig, &Shutdown) -> Result<Arc<dyn Agent>, AgentError> + Send + Sync + 'static,
    {
        self.agent_factory = Arc::new(factory);
        self
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Register a service with this host's registry.
    pub fn import(&self, descriptor: ServiceDescriptor) -> Result<(), HostError> {
        Ok(self.registry.register(descriptor)?)
    }

    /// Bootstrap from `cli` and `env`, run every registered service, and
    /// return once all of them are terminal.
    ///
    /// An error means bootstrap failed and no service was started.
    pub async fn run<I>(&self, cli: &Cli, env: I) -> Result<RunSummary, HostError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let boot = startup::bootstrap(cli, env, self.agent_factory.as_ref()).inspect_err(|e| {
            tracing::error!(stage = e.stage(), error = %e, "Bootstrap failed");
        })?;

        let board = ServiceBoard::new();
        let admin = if boot.config.admin.enabled {
            let state = AdminState::new(boot.agent.network().id(), board.clone(), &boot.config.admin.api_key);
            let handle = admin::serve(&boot.config.admin, state, boot.shutdown.subscribe())
                .await
                .map_err(HostError::Admin)
                .inspect_err(|e| tracing::error!(stage = e.stage(), error = %e, "Bootstrap failed"))?;
            Some(handle)
        } else {
            None
        };

        let signal_listener = signals::spawn_listener(boot.shutdown.clone());

        let summary = Orchestrator::new(boot.agent.clone())
            .with_board(board)
            .run(&self.registry)
            .await;

        signal_listener.abort();
        boot.shutdown.trigger();
        if let Some(handle) = admin {
            let _ = handle.await;
        }

        tracing::info!(
            node_id = %summary.node_id,
            completed = summary.succeeded().count(),
            failed = summary.failed().count(),
            "All services terminated"
        );
        Ok(summary)
    }
}

/// Run the process-wide registry with the process's own flags and environment.
pub async fn run() -> Result<RunSummary, HostError> {
    Host::global().run(&Cli::parse(), std::env::vars()).await
}
