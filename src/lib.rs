//! Mesh service host library.
//!
//! Services register a [`ServiceDescriptor`] with the process-wide registry
//! (usually at startup via [`import_service`]), then [`run`] bootstraps the
//! host and runs every registered service concurrently until all of them
//! have returned.

pub mod admin;
pub mod agent;
pub mod builtin;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;
pub mod service;

pub use error::HostError;
pub use lifecycle::{run, Host, RunSummary};
pub use registry::{import_service, ServiceDescriptor, ServiceRegistry};
pub use service::{ServiceContext, ServiceError, ServiceOption};
