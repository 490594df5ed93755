//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     ← config file (TOML, optional)
//!     ← MESH_* environment variables
//!     ← --set flags
//!     → loader.rs (merge layers & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → logging, agent, admin
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX};
pub use schema::{AdminConfig, AgentConfig, HostConfig, LogFormat, LoggingConfig, ObservabilityConfig};
pub use validation::ValidationError;
