//! Runtime context handed to a service entry point.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use crate::lifecycle::ShutdownSignal;
use crate::net::Listener;
use crate::service::ServiceError;

/// Everything a running service gets from the agent that runs it.
pub struct ServiceContext {
    name: String,
    node_id: String,
    labels: BTreeMap<String, String>,
    listener: Option<Listener>,
    settings: Option<toml::Table>,
    shutdown: ShutdownSignal,
}

impl ServiceContext {
    /// Create a context with no listener, labels or settings.
    pub fn new(
        name: impl Into<String>,
        node_id: impl Into<String>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            name: name.into(),
            node_id: node_id.into(),
            labels: BTreeMap::new(),
            listener: None,
            settings: None,
            shutdown,
        }
    }

    pub fn with_listener(mut self, listener: Option<Listener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_settings(mut self, settings: Option<toml::Table>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Registered service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Network identity of the agent running this service.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Take the listener bound for this service, if one was requested.
    pub fn take_listener(&mut self) -> Option<Listener> {
        self.listener.take()
    }

    /// Raw `[services.<name>]` configuration table.
    pub fn raw_settings(&self) -> Option<&toml::Table> {
        self.settings.as_ref()
    }

    /// Decode the service's configuration table.
    ///
    /// A service without a configuration section gets `T::default()`.
    pub fn settings<T>(&self) -> Result<T, ServiceError>
    where
        T: DeserializeOwned + Default,
    {
        match &self.settings {
            Some(table) => toml::Value::Table(table.clone())
                .try_into()
                .map_err(|e: toml::de::Error| ServiceError::Settings(e.to_string())),
            None => Ok(T::default()),
        }
    }

    /// Wait until the host asks services to stop.
    ///
    /// Also returns when the shutdown coordinator is gone.
    pub async fn shutdown_signal(&mut self) {
        self.shutdown.recv().await;
    }

    /// Whether the host has already asked services to stop.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_triggered()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("name", &self.name)
            .field("node_id", &self.node_id)
            .field("labels", &self.labels)
            .field("has_listener", &self.listener.is_some())
            .field("has_settings", &self.settings.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Settings {
        interval_ms: u64,
        greeting: String,
    }

    #[test]
    fn test_settings_default_when_missing() {
        let shutdown = Shutdown::new();
        let ctx = ServiceContext::new("svc", "node", shutdown.subscribe());
        let settings: Settings = ctx.settings().unwrap();
        assert_eq!(settings.interval_ms, 0);
        assert!(settings.greeting.is_empty());
    }

    #[test]
    fn test_settings_decoded_from_table() {
        let shutdown = Shutdown::new();
        let table: toml::Table = toml::from_str("interval_ms = 250\ngreeting = \"hi\"").unwrap();
        let ctx = ServiceContext::new("svc", "node", shutdown.subscribe()).with_settings(Some(table));

        let settings: Settings = ctx.settings().unwrap();
        assert_eq!(settings.interval_ms, 250);
        assert_eq!(settings.greeting, "hi");
    }

    #[test]
    fn test_settings_type_mismatch() {
        let shutdown = Shutdown::new();
        let table: toml::Table = toml::from_str("interval_ms = \"soon\"").unwrap();
        let ctx = ServiceContext::new("svc", "node", shutdown.subscribe()).with_settings(Some(table));

        let err = ctx.settings::<Settings>().unwrap_err();
        assert!(matches!(err, ServiceError::Settings(_)));
    }

    #[tokio::test]
    async fn test_shutdown_signal() {
        let shutdown = Shutdown::new();
        let mut ctx = ServiceContext::new("svc", "node", shutdown.subscribe());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), ctx.shutdown_signal())
            .await
            .expect("shutdown signal should be observed");
    }
}
