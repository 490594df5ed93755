//! Service construction options.

use std::time::Duration;

/// An option attached to a service descriptor.
///
/// The orchestrator passes options through untouched: registration options to
/// [`Agent::register_service`](crate::agent::Agent::register_service), run
/// options to [`ServiceHandle::run`](crate::agent::ServiceHandle::run). An
/// agent ignores the options that do not apply to the phase it is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOption {
    /// Bind a listener for the service at this address (registration).
    Listen(String),

    /// Concurrent connection limit for the service listener (registration).
    MaxConnections(usize),

    /// Wait before invoking the entry point (run).
    StartDelay(Duration),

    /// Fail the service if it runs longer than this (run).
    Deadline(Duration),

    /// Free-form key/value visible to the service through its context.
    Label(String, String),
}

impl ServiceOption {
    /// Convenience constructor for [`ServiceOption::Label`].
    pub fn label(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Label(key.into(), value.into())
    }
}
