//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use mesh_host::agent::{Agent, AgentError, Network, ServiceHandle};
use mesh_host::lifecycle::Shutdown;
use mesh_host::service::ServiceMain;
use mesh_host::{ServiceContext, ServiceDescriptor, ServiceError, ServiceOption};

/// Agent that hands out in-memory handles and records every registration.
pub struct FakeAgent {
    network: Network,
    shutdown: Shutdown,
    rejected: HashSet<String>,
    registrations: AtomicUsize,
}

impl FakeAgent {
    pub fn new(node_id: &str) -> Self {
        Self {
            network: Network::new(node_id, "127.0.0.1"),
            shutdown: Shutdown::new(),
            rejected: HashSet::new(),
            registrations: AtomicUsize::new(0),
        }
    }

    /// Refuse registrations for `name`.
    pub fn rejecting(mut self, name: &str) -> Self {
        self.rejected.insert(name.to_string());
        self
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }
}

impl Agent for FakeAgent {
    fn network(&self) -> &Network {
        &self.network
    }

    fn register_service<'a>(
        &'a self,
        name: &'a str,
        _options: &'a [ServiceOption],
    ) -> BoxFuture<'a, Result<Box<dyn ServiceHandle>, AgentError>> {
        async move {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            if self.rejected.contains(name) {
                return Err(AgentError::Rejected(format!("{name} is not allowed")));
            }
            Ok(Box::new(FakeHandle {
                name: name.to_string(),
                node_id: self.network.id().to_string(),
                shutdown: self.shutdown.clone(),
            }) as Box<dyn ServiceHandle>)
        }
        .boxed()
    }
}

struct FakeHandle {
    name: String,
    node_id: String,
    shutdown: Shutdown,
}

impl ServiceHandle for FakeHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        self: Box<Self>,
        main: Arc<dyn ServiceMain>,
        _options: Vec<ServiceOption>,
    ) -> BoxFuture<'static, Result<(), ServiceError>> {
        let ctx = ServiceContext::new(self.name, self.node_id, self.shutdown.subscribe());
        main.run(ctx)
    }
}

/// Service that bumps `counter` once and succeeds.
pub fn counting(name: &str, counter: Arc<AtomicUsize>) -> ServiceDescriptor {
    ServiceDescriptor::new(name, move |_ctx: ServiceContext| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), ServiceError>(())
        }
    })
}

/// Service that sleeps for `delay`, then succeeds.
pub fn sleeping(name: &str, delay: Duration) -> ServiceDescriptor {
    ServiceDescriptor::new(name, move |_ctx: ServiceContext| async move {
        tokio::time::sleep(delay).await;
        Ok::<(), ServiceError>(())
    })
}

/// Service that fails with `message` after `delay`.
pub fn failing(name: &str, delay: Duration, message: &'static str) -> ServiceDescriptor {
    ServiceDescriptor::new(name, move |_ctx: ServiceContext| async move {
        tokio::time::sleep(delay).await;
        Err::<(), ServiceError>(ServiceError::failed(message))
    })
}

/// Service that panics with `message`.
pub fn panicking(name: &str, message: &'static str) -> ServiceDescriptor {
    ServiceDescriptor::new(name, move |_ctx: ServiceContext| async move {
        if !message.is_empty() {
            panic!("{message}");
        }
        Ok::<(), ServiceError>(())
    })
}

/// Service that waits for host shutdown.
pub fn until_shutdown(name: &str) -> ServiceDescriptor {
    ServiceDescriptor::new(name, |mut ctx: ServiceContext| async move {
        ctx.shutdown_signal().await;
        Ok::<(), ServiceError>(())
    })
}
