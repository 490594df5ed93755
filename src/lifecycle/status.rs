//! Per-service status board.
//!
//! # States
//! ```text
//! Pending → Starting → Running → Completed
//!                 ↘          ↘
//!                   Failed      Failed
//! ```
//!
//! Written by the orchestrator, read by the admin API.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;

/// Lifecycle state of one service within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Pending,
    Starting,
    Running,
    Completed,
    Failed,
}

impl ServiceState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ServiceState::Completed | ServiceState::Failed)
    }
}

/// Latest known status of a service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub state: ServiceState,
    /// Failure message for `failed`.
    pub detail: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub updated_at_ms: u64,
}

/// Shared, concurrently updated map of service statuses.
#[derive(Debug, Clone, Default)]
pub struct ServiceBoard {
    inner: Arc<DashMap<String, ServiceStatus>>,
}

impl ServiceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, name: &str, state: ServiceState, detail: Option<String>) {
        let updated_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.inner.insert(
            name.to_string(),
            ServiceStatus {
                name: name.to_string(),
                state,
                detail,
                updated_at_ms,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<ServiceStatus> {
        self.inner.get(name).map(|r| r.value().clone())
    }

    /// All statuses, ordered by service name.
    pub fn all(&self) -> Vec<ServiceStatus> {
        let mut statuses: Vec<_> = self.inner.iter().map(|r| r.value().clone()).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    pub fn count_in(&self, state: ServiceState) -> usize {
        self.inner.iter().filter(|r| r.value().state == state).count()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_transitions() {
        let board = ServiceBoard::new();
        board.mark("b", ServiceState::Pending, None);
        board.mark("a", ServiceState::Running, None);
        board.mark("b", ServiceState::Failed, Some("boom".into()));

        let all = board.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "a");
        assert_eq!(all[1].state, ServiceState::Failed);
        assert_eq!(all[1].detail.as_deref(), Some("boom"));
        assert_eq!(board.count_in(ServiceState::Running), 1);
        assert!(ServiceState::Failed.is_terminal());
        assert!(!ServiceState::Running.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ServiceState::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
