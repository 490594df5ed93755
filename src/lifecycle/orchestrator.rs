//! Concurrent service orchestration.
//!
//! # Responsibilities
//! - Take one registry snapshot per run
//! - Launch one task per service against the shared agent
//! - Keep every failure (registration, run, panic) inside its own task
//! - Return only when every launched task is terminal
//!
//! # Design Decisions
//! - Tasks join a `JoinSet` at spawn time, before they can be scheduled, so
//!   the completion barrier never misses a task
//! - No ordering, retry or restart between services

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::agent::Agent;
use crate::lifecycle::status::{ServiceBoard, ServiceState};
use crate::observability::metrics;
use crate::registry::{ServiceDescriptor, ServiceRegistry};

/// Terminal outcome of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The entry point returned success.
    Completed,
    /// The agent refused the registration; the entry point never ran.
    RegistrationFailed(String),
    /// The entry point returned an error.
    RunFailed(String),
    /// The entry point panicked.
    Panicked(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::RegistrationFailed(_) => "registration_failed",
            Outcome::RunFailed(_) => "run_failed",
            Outcome::Panicked(_) => "panicked",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Outcome::Completed => None,
            Outcome::RegistrationFailed(e) | Outcome::RunFailed(e) | Outcome::Panicked(e) => {
                Some(e.clone())
            }
        }
    }
}

/// What happened to one service during a run.
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    pub name: String,
    pub outcome: Outcome,
    /// Time from launch to terminal state.
    pub elapsed: Duration,
}

/// Report of a finished run. Failed services are data here, not errors.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub node_id: String,
    pub outcomes: Vec<ServiceOutcome>,
}

impl RunSummary {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.outcome)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| !o.outcome.is_success())
    }
}

/// Starts every registered service and waits for all of them.
pub struct Orchestrator {
    agent: Arc<dyn Agent>,
    board: ServiceBoard,
}

impl Orchestrator {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self {
            agent,
            board: ServiceBoard::new(),
        }
    }

    /// Publish statuses to `board` (shared with the admin API).
    pub fn with_board(mut self, board: ServiceBoard) -> Self {
        self.board = board;
        self
    }

    pub fn board(&self) -> &ServiceBoard {
        &self.board
    }

    /// Run every service registered in `registry` to completion.
    pub async fn run(&self, registry: &ServiceRegistry) -> RunSummary {
        let services = registry.snapshot();
        let node_id = self.agent.network().id().to_string();

        if services.is_empty() {
            tracing::info!(node_id = %node_id, "No services registered, nothing to run");
            return RunSummary {
                node_id,
                outcomes: Vec::new(),
            };
        }

        tracing::info!(node_id = %node_id, services = services.len(), "Starting services");

        let mut tasks = JoinSet::new();
        for (name, descriptor) in services {
            self.board.mark(&name, ServiceState::Pending, None);
            tasks.spawn(supervise(self.agent.clone(), self.board.clone(), descriptor));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                // Panics are caught inside the task; only a runtime shutdown lands here.
                Err(e) => tracing::error!(error = %e, "Service task aborted"),
            }
        }

        RunSummary { node_id, outcomes }
    }
}

/// Run one service and catch a panic from its entry point.
async fn supervise(agent: Arc<dyn Agent>, board: ServiceBoard, descriptor: ServiceDescriptor) -> ServiceOutcome {
    let name = descriptor.name.clone();
    let started = Instant::now();

    let outcome = AssertUnwindSafe(run_service(agent.as_ref(), &board, descriptor))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            tracing::error!(service = %name, panic = %message, "Service panicked");
            Outcome::Panicked(message)
        });

    board.mark(
        &name,
        if outcome.is_success() {
            ServiceState::Completed
        } else {
            ServiceState::Failed
        },
        outcome.detail(),
    );
    metrics::record_service_exit(&name, outcome.label());

    ServiceOutcome {
        name,
        outcome,
        elapsed: started.elapsed(),
    }
}

async fn run_service(agent: &dyn Agent, board: &ServiceBoard, descriptor: ServiceDescriptor) -> Outcome {
    let ServiceDescriptor {
        name,
        main,
        registration_options,
        run_options,
    } = descriptor;

    tracing::info!(service = %name, "Service starting");
    board.mark(&name, ServiceState::Starting, None);
    metrics::record_service_start(&name);

    let handle = match agent.register_service(&name, &registration_options).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(service = %name, error = %e, "Service registration failed");
            return Outcome::RegistrationFailed(e.to_string());
        }
    };

    board.mark(&name, ServiceState::Running, None);
    let _running = metrics::RunningGuard::enter();

    match handle.run(main, run_options).await {
        Ok(()) => {
            tracing::info!(service = %name, "Service stopped");
            Outcome::Completed
        }
        Err(e) => {
            tracing::error!(service = %name, error = %e, "Service stopped with error");
            Outcome::RunFailed(e.to_string())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
