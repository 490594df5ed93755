//! In-process agent.
//!
//! # Responsibilities
//! - Own the node identity
//! - Claim service names for the lifetime of their handle
//! - Bind service listeners requested at registration
//! - Apply run options (start delay, deadline, labels) around the entry point

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use crate::agent::{Agent, AgentError, Network, ServiceHandle};
use crate::config::{AgentConfig, HostConfig};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::net::Listener;
use crate::service::{ServiceContext, ServiceError, ServiceMain, ServiceOption};

/// Agent that runs services inside the host process.
#[derive(Debug)]
pub struct LocalAgent {
    network: Network,
    config: AgentConfig,
    service_settings: BTreeMap<String, toml::Table>,
    registrations: Arc<DashMap<String, Instant>>,
    /// One permit per allowed live registration; `None` when unlimited.
    capacity: Option<Arc<Semaphore>>,
    shutdown: Shutdown,
}

impl LocalAgent {
    /// Construct the agent from the merged host configuration.
    pub fn new(config: &HostConfig, shutdown: &Shutdown) -> Result<Self, AgentError> {
        let node_id = match config.agent.node_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                validate_node_id(id)?;
                id.to_string()
            }
            _ => format!("mesh-{}", Uuid::new_v4().simple()),
        };

        tracing::info!(
            node_id = %node_id,
            advertise_host = %config.agent.advertise_host,
            max_services = config.agent.max_services,
            "Agent created"
        );

        Ok(Self {
            network: Network::new(node_id, config.agent.advertise_host.clone()),
            config: config.agent.clone(),
            service_settings: config.services.clone(),
            registrations: Arc::new(DashMap::new()),
            capacity: (config.agent.max_services > 0)
                .then(|| Arc::new(Semaphore::new(config.agent.max_services))),
            shutdown: shutdown.clone(),
        })
    }

    /// Names of services currently holding a registration.
    pub fn registered_services(&self) -> Vec<String> {
        let mut names: Vec<_> = self.registrations.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    fn claim(&self, name: &str) -> Result<Registration, AgentError> {
        // The permit is taken first; an occupied name drops it again.
        let slot = match &self.capacity {
            Some(capacity) => Some(capacity.clone().try_acquire_owned().map_err(|_| {
                AgentError::CapacityExceeded {
                    limit: self.config.max_services,
                }
            })?),
            None => None,
        };

        match self.registrations.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AgentError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                Ok(Registration {
                    name: name.to_string(),
                    registrations: self.registrations.clone(),
                    _slot: slot,
                })
            }
        }
    }
}

fn validate_node_id(id: &str) -> Result<(), AgentError> {
    let valid = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AgentError::InvalidNodeId(id.to_string()))
    }
}

impl Agent for LocalAgent {
    fn network(&self) -> &Network {
        &self.network
    }

    fn register_service<'a>(
        &'a self,
        name: &'a str,
        options: &'a [ServiceOption],
    ) -> BoxFuture<'a, Result<Box<dyn ServiceHandle>, AgentError>> {
        Box::pin(async move {
            let registration = self.claim(name)?;
            let settings = self.service_settings.get(name).cloned();

            let mut listen = None;
            let mut max_connections = self.config.default_max_connections;
            let mut labels = BTreeMap::new();
            for option in options {
                match option {
                    ServiceOption::Listen(address) => listen = Some(address.clone()),
                    ServiceOption::MaxConnections(limit) => max_connections = *limit,
                    ServiceOption::Label(key, value) => {
                        labels.insert(key.clone(), value.clone());
                    }
                    ServiceOption::StartDelay(_) | ServiceOption::Deadline(_) => {}
                }
            }

            // Configuration wins over the address compiled into the descriptor.
            if let Some(address) = settings
                .as_ref()
                .and_then(|s| s.get("listen"))
                .and_then(|v| v.as_str())
            {
                listen = Some(address.to_string());
            }

            let listener = match listen {
                Some(address) => match Listener::bind(&address, max_connections).await {
                    Ok(listener) => Some(listener),
                    Err(source) => {
                        return Err(AgentError::Bind {
                            service: name.to_string(),
                            address,
                            source,
                        })
                    }
                },
                None => None,
            };

            tracing::info!(
                service = %name,
                node_id = %self.network.id(),
                listening = listener.is_some(),
                "Service registered with agent"
            );

            Ok(Box::new(LocalServiceHandle {
                registration,
                node_id: self.network.id().to_string(),
                listener,
                settings,
                labels,
                shutdown: self.shutdown.subscribe(),
            }) as Box<dyn ServiceHandle>)
        })
    }
}

/// Holds a service name in the agent until dropped.
#[derive(Debug)]
struct Registration {
    name: String,
    registrations: Arc<DashMap<String, Instant>>,
    _slot: Option<OwnedSemaphorePermit>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some((_, since)) = self.registrations.remove(&self.name) {
            tracing::debug!(
                service = %self.name,
                registered_ms = since.elapsed().as_millis() as u64,
                "Service deregistered"
            );
        }
    }
}

/// Handle returned by [`LocalAgent::register_service`].
pub struct LocalServiceHandle {
    registration: Registration,
    node_id: String,
    listener: Option<Listener>,
    settings: Option<toml::Table>,
    labels: BTreeMap<String, String>,
    shutdown: ShutdownSignal,
}

impl ServiceHandle for LocalServiceHandle {
    fn name(&self) -> &str {
        &self.registration.name
    }

    fn run(
        self: Box<Self>,
        main: Arc<dyn ServiceMain>,
        options: Vec<ServiceOption>,
    ) -> BoxFuture<'static, Result<(), ServiceError>> {
        let LocalServiceHandle {
            registration,
            node_id,
            listener,
            settings,
            mut labels,
            shutdown,
        } = *self;

        Box::pin(async move {
            let mut start_delay = None;
            let mut deadline = None;
            for option in options {
                match option {
                    ServiceOption::StartDelay(delay) => start_delay = Some(delay),
                    ServiceOption::Deadline(limit) => deadline = Some(limit),
                    ServiceOption::Label(key, value) => {
                        labels.insert(key, value);
                    }
                    ServiceOption::Listen(_) | ServiceOption::MaxConnections(_) => {}
                }
            }

            if let Some(delay) = start_delay {
                tokio::time::sleep(delay).await;
            }

            let ctx = ServiceContext::new(registration.name.clone(), node_id, shutdown)
                .with_labels(labels)
                .with_listener(listener)
                .with_settings(settings);

            let result = match deadline {
                Some(limit) => tokio::time::timeout(limit, main.run(ctx))
                    .await
                    .unwrap_or(Err(ServiceError::DeadlineExceeded(limit))),
                None => main.run(ctx).await,
            };

            drop(registration);
            result
        })
    }
}
