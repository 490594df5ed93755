//! Service descriptors.

use std::sync::Arc;

use crate::service::{ServiceMain, ServiceOption};

/// Names one service and carries its entry point plus construction options.
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// Unique service name; the registry key and the identity used in logs.
    pub name: String,

    /// Entry point, invoked once per orchestrator run.
    pub main: Arc<dyn ServiceMain>,

    /// Options passed to the agent when the service is registered.
    pub registration_options: Vec<ServiceOption>,

    /// Options passed to the service handle when the service is run.
    pub run_options: Vec<ServiceOption>,
}

impl ServiceDescriptor {
    /// Create a descriptor with no options.
    pub fn new(name: impl Into<String>, main: impl ServiceMain) -> Self {
        Self {
            name: name.into(),
            main: Arc::new(main),
            registration_options: Vec::new(),
            run_options: Vec::new(),
        }
    }

    pub fn with_registration_option(mut self, option: ServiceOption) -> Self {
        self.registration_options.push(option);
        self
    }

    pub fn with_run_option(mut self, option: ServiceOption) -> Self {
        self.run_options.push(option);
        self
    }

    /// Use one option list for both registration and run.
    pub fn with_options(mut self, options: impl IntoIterator<Item = ServiceOption>) -> Self {
        let options: Vec<_> = options.into_iter().collect();
        self.registration_options = options.clone();
        self.run_options = options;
        self
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("registration_options", &self.registration_options)
            .field("run_options", &self.run_options)
            .finish_non_exhaustive()
    }
}
