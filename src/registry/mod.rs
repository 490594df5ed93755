//! Service registry.
//!
//! # Data Flow
//! ```text
//! Initialization code (any number of call sites)
//!     → import_service / ServiceRegistry::register (insert-once, write lock)
//!
//! Host::run
//!     → Orchestrator takes one snapshot (owned copy, lock released)
//!     → one task per snapshot entry
//! ```
//!
//! # Design Decisions
//! - Append-only: no update or delete
//! - Duplicate names are a build mistake, reported as a fatal-class error
//! - The registry is an injectable value; the process-wide instance is just
//!   one `ServiceRegistry` behind a `OnceLock`

pub mod descriptor;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use thiserror::Error;

pub use descriptor::ServiceDescriptor;

/// Exit status used when registration fails (EX_SOFTWARE).
pub const REGISTRATION_EXIT_CODE: i32 = 70;

/// Errors raised by [`ServiceRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A service with this name is already registered.
    #[error("duplicate import service {0}")]
    DuplicateService(String),

    /// Service names must not be empty.
    #[error("service name must not be empty")]
    EmptyName,
}

impl RegistryError {
    /// Registration errors mean the binary was assembled wrong; the host
    /// must not continue.
    pub fn is_fatal(&self) -> bool {
        match self {
            RegistryError::DuplicateService(_) | RegistryError::EmptyName => true,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        REGISTRATION_EXIT_CODE
    }
}

/// Map from service name to descriptor.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, ServiceDescriptor>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `descriptor` under its name.
    pub fn register(&self, descriptor: ServiceDescriptor) -> Result<(), RegistryError> {
        if descriptor.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let name = descriptor.name.clone();
        {
            let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
            if services.contains_key(&name) {
                return Err(RegistryError::DuplicateService(name));
            }
            services.insert(name.clone(), descriptor);
        }

        tracing::info!(service = %name, "Imported service");
        Ok(())
    }

    /// Point-in-time copy of every registered descriptor.
    pub fn snapshot(&self) -> HashMap<String, ServiceDescriptor> {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL_REGISTRY: OnceLock<Arc<ServiceRegistry>> = OnceLock::new();

/// The process-wide registry, created on first use.
pub fn global() -> &'static Arc<ServiceRegistry> {
    GLOBAL_REGISTRY.get_or_init(|| Arc::new(ServiceRegistry::new()))
}

/// Register a service into the process-wide registry.
///
/// Registration runs before logging is configured, so a failure is written
/// to stderr as well as to `tracing`, then the process exits.
pub fn import_service(descriptor: ServiceDescriptor) {
    if let Err(err) = global().register(descriptor) {
        tracing::error!(error = %err, "Service registration failed");
        eprintln!("mesh-host: {err}");
        std::process::exit(err.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ServiceContext, ServiceError};
    use std::thread;

    async fn noop(_ctx: ServiceContext) -> Result<(), ServiceError> {
        Ok(())
    }

    #[test]
    fn test_snapshot_contains_registered_services() {
        let registry = ServiceRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(ServiceDescriptor::new(name, noop)).unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);
        for name in ["a", "b", "c"] {
            assert_eq!(snapshot[name].name, name);
        }
    }

    #[test]
    fn test_duplicate_is_fatal() {
        let registry = ServiceRegistry::new();
        registry.register(ServiceDescriptor::new("a", noop)).unwrap();

        let err = registry.register(ServiceDescriptor::new("a", noop)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateService("a".into()));
        assert!(err.is_fatal());
        assert_eq!(err.exit_code(), REGISTRATION_EXIT_CODE);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let registry = ServiceRegistry::new();
        let err = registry.register(ServiceDescriptor::new("", noop)).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_registrations() {
        let registry = ServiceRegistry::new();
        registry.register(ServiceDescriptor::new("a", noop)).unwrap();

        let snapshot = registry.snapshot();
        registry.register(ServiceDescriptor::new("b", noop)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains_key("b"));
        assert!(registry.contains("b"));
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(ServiceRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    registry
                        .register(ServiceDescriptor::new(format!("svc-{i}"), noop))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_concurrent_duplicate_registers_once() {
        let registry = Arc::new(ServiceRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.register(ServiceDescriptor::new("same", noop)))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(global(), global()));
    }
}
