//! System collaborators.
//!
//! This module provides the interfaces the updater uses to touch the host,
//! plus their real implementations:
//! - `CommandExecutor` / `SystemExecutor`: runs `apt-get`, `apt-cache` and `dpkg`
//! - `IdentityProbe` / `HostIdentityProbe`: detects distributor, codename and architecture

mod executor;
mod identity;

// Re-export public API
pub use executor::{CommandExecutor, CommandOutput, SystemExecutor};
pub use identity::{parse_os_release, HostIdentityProbe, IdentityProbe, SystemIdentity};
