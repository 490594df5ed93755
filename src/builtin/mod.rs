//! Services compiled into the `mesh-host` binary.

pub mod echo;
pub mod heartbeat;

use crate::registry;

/// Register every built-in service with the process-wide registry.
pub fn import_all() {
    registry::import_service(heartbeat::descriptor());
    registry::import_service(echo::descriptor());
}
