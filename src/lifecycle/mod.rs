//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging → Init metrics → Build agent
//!
//! Run (host.rs, orchestrator.rs):
//!     Registry snapshot → one task per service → wait for all → summary
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → stop flag raised for every service → services return on their own
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logging, then the agent
//! - Any startup error is fatal; no service starts on a partial bootstrap
//! - Service failures are isolated and reported, never propagated

pub mod host;
pub mod orchestrator;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod status;

pub use host::{run, Host};
pub use orchestrator::{Orchestrator, Outcome, RunSummary, ServiceOutcome};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use status::{ServiceBoard, ServiceState, ServiceStatus};
