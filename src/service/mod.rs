//! Service entry points.
//!
//! # Data Flow
//! ```text
//! ServiceDescriptor (registry)
//!     → Agent::register_service (registration options)
//!     → ServiceHandle::run (run options)
//!     → ServiceMain::run(ServiceContext)
//!     → Result<(), ServiceError>  (terminal outcome, logged by the orchestrator)
//! ```
//!
//! # Design Decisions
//! - Entry points are async and boxed so agents can be trait objects
//! - Plain `async fn(ServiceContext)` functions and closures are entry points
//! - Options are opaque to the core; only the agent interprets them

pub mod context;
pub mod options;

use std::future::Future;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

pub use context::ServiceContext;
pub use options::ServiceOption;

/// Future returned by a service entry point.
pub type ServiceFuture = BoxFuture<'static, Result<(), ServiceError>>;

/// A service entry point.
///
/// Invoked exactly once per orchestrator run, on a dedicated task.
pub trait ServiceMain: Send + Sync + 'static {
    /// Run the service until it terminates.
    fn run(&self, ctx: ServiceContext) -> ServiceFuture;
}

impl<F, Fut> ServiceMain for F
where
    F: Fn(ServiceContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    fn run(&self, ctx: ServiceContext) -> ServiceFuture {
        Box::pin(self(ctx))
    }
}

/// Terminal error of a running service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service reported a failure.
    #[error("{0}")]
    Failed(String),

    /// I/O failure inside the service.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service outlived the deadline it was run with.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The service's configuration section could not be decoded.
    #[error("invalid settings: {0}")]
    Settings(String),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    #[tokio::test]
    async fn test_closure_is_entry_point() {
        let main = |ctx: ServiceContext| async move {
            if ctx.name() == "ok" {
                Ok(())
            } else {
                Err(ServiceError::failed("boom"))
            }
        };
        let shutdown = Shutdown::new();

        let ok = ServiceMain::run(&main, ServiceContext::new("ok", "node", shutdown.subscribe())).await;
        assert!(ok.is_ok());

        let err = ServiceMain::run(&main, ServiceContext::new("bad", "node", shutdown.subscribe()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::DeadlineExceeded(Duration::from_millis(50));
        assert_eq!(err.to_string(), "deadline of 50ms exceeded");

        let err = ServiceError::from(std::io::Error::other("reset"));
        assert!(err.to_string().contains("reset"));
    }
}
