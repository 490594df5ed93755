//! Network agent.
//!
//! # Data Flow
//! ```text
//! HostConfig [agent] + [services]
//!     → LocalAgent::new (node identity, limits)
//!
//! Per service task:
//!     Agent::register_service(name, registration options)
//!     → ServiceHandle (listener bound, name claimed)
//!     → ServiceHandle::run(entry point, run options)
//!     → name released when the handle is done
//! ```
//!
//! # Design Decisions
//! - The orchestrator only sees the `Agent` / `ServiceHandle` traits
//! - Methods return boxed futures so agents can be shared as `Arc<dyn Agent>`
//! - The agent is read-only from the orchestrator's point of view

pub mod local;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::net::ListenerError;
use crate::service::{ServiceError, ServiceMain, ServiceOption};

pub use local::LocalAgent;

/// Network identity of an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    id: String,
    advertise_host: String,
}

impl Network {
    pub fn new(id: impl Into<String>, advertise_host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            advertise_host: advertise_host.into(),
        }
    }

    /// Node id on the mesh.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn advertise_host(&self) -> &str {
        &self.advertise_host
    }
}

/// Errors raised by an agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The configured node id cannot be used on the mesh.
    #[error("invalid node id `{0}`")]
    InvalidNodeId(String),

    /// A live registration already uses this name.
    #[error("service {0} is already registered")]
    AlreadyRegistered(String),

    /// The agent's registration limit is reached.
    #[error("service limit of {limit} reached")]
    CapacityExceeded { limit: usize },

    /// The service listener could not be bound.
    #[error("service {service} cannot listen on {address}: {source}")]
    Bind {
        service: String,
        address: String,
        #[source]
        source: ListenerError,
    },

    /// The agent refused the service for another reason.
    #[error("registration rejected: {0}")]
    Rejected(String),
}

/// The mesh agent collaborator.
pub trait Agent: Send + Sync {
    fn network(&self) -> &Network;

    /// Register a service under `name`.
    fn register_service<'a>(
        &'a self,
        name: &'a str,
        options: &'a [ServiceOption],
    ) -> BoxFuture<'a, Result<Box<dyn ServiceHandle>, AgentError>>;
}

/// A registered service, ready to run.
pub trait ServiceHandle: Send {
    fn name(&self) -> &str;

    /// Run `main` to completion.
    fn run(
        self: Box<Self>,
        main: Arc<dyn ServiceMain>,
        options: Vec<ServiceOption>,
    ) -> BoxFuture<'static, Result<(), ServiceError>>;
}
