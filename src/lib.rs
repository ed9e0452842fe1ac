//! apt_mirror_updater library: automated apt mirror selection
//!
//! This library discovers the mirrors of Debian, Ubuntu and derivative
//! distributions, validates and ranks them, and maintains the host's package
//! source configuration and package lists on top of that ranking.
//!
//! # Example
//!
//! ```no_run
//! use apt_mirror_updater::{AptMirrorUpdater, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     distributor_id: Some("ubuntu".to_string()),
//!     distribution_codename: Some("noble".to_string()),
//!     architecture: Some("amd64".to_string()),
//!     ..Default::default()
//! };
//!
//! let updater = AptMirrorUpdater::new(config).await?;
//! for mirror in updater.ranked_mirrors().await? {
//!     println!("{}", mirror.mirror_url);
//! }
//! println!("Best mirror: {}", updater.best_mirror().await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod backends;
pub mod config;
mod error_handling;
pub mod http;
pub mod initialization;
pub mod ranking;
pub mod releases;
pub mod sources;
pub mod system;
pub mod updater;

// Re-export public API
pub use backends::{MirrorBackend, MirrorCandidate};
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{
    CommandError, FetchError, InitializationError, MirrorEntryError, ProbeErrorType,
    ProbeStats, ResolutionError, UpdaterError,
};
pub use releases::{
    coerce_release, coerce_release_for, discover_releases, DistributorId, Release, ReleaseQuery,
    ReleaseVersion,
};
pub use updater::{AptMirrorUpdater, Collaborators};
