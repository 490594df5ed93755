//! Mesh service host
//!
//! Runs every service compiled into this binary inside one process.
//!
//! # Architecture Overview
//!
//! ```text
//!   import_service ──▶ registry ──snapshot──▶ orchestrator
//!                                                  │
//!   file → MESH_* env → --set  ──▶ bootstrap       │ one task per service
//!        (config, logging, metrics, agent)         ▼
//!                                   agent.register_service → handle.run
//!                                                  │
//!                         admin API ◀── board ◀────┘
//! ```
//!
//! The process exits once every service has returned. Bootstrap failures
//! exit with status 1, duplicate registrations with status 70.

use mesh_host::{builtin, observability};

#[tokio::main]
async fn main() {
    // Registration and config loading log before `[logging]` is known.
    observability::install_default();
    builtin::import_all();

    match mesh_host::run().await {
        Ok(summary) => {
            if summary.failed().count() > 0 {
                tracing::warn!(failed = summary.failed().count(), "Some services failed");
            }
        }
        Err(e) => {
            eprintln!("mesh-host: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
