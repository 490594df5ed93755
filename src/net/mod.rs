//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceOption::Listen / [services.<name>] listen
//!     → LocalAgent binds listener.rs at registration
//!     → ServiceContext::take_listener
//!     → service accept loop (permit held per connection)
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Binding happens at registration so a bad address fails only that service

pub mod listener;

pub use listener::{ConnectionPermit, Listener, ListenerError};
