//! Configuration constants.
//!
//! This module defines the operational parameters used throughout the crate:
//! network timeouts, size limits, retry backoff and the external commands the
//! updater runs.

/// Maximum number of concurrent mirror probes (semaphore limit)
pub const SEMAPHORE_LIMIT: usize = 30;

/// Default timeout for a single mirror probe in seconds.
///
/// A probe that exceeds this budget is treated as inconclusive (the mirror is
/// assumed to be available) rather than as a failure.
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// Default timeout for fetching a mirror list in seconds.
///
/// Mirror lists are large HTML documents (the Launchpad listing is well over
/// half a megabyte) so this is more generous than the probe timeout.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default number of discovered mirrors that are actually probed.
///
/// Ranking hundreds of mirrors takes a long time and doesn't improve the
/// result much, so the candidate list is pre-selected down to this size.
pub const MAX_MIRRORS: usize = 50;

/// Maximum response body size in bytes (16MB)
/// Responses larger than this are rejected to prevent memory exhaustion
pub const MAX_RESPONSE_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Default User-Agent string for HTTP requests.
pub const DEFAULT_USER_AGENT: &str = concat!("apt-mirror-updater/", env!("CARGO_PKG_VERSION"));

/// Default location of the system's package source configuration.
pub const SOURCES_LIST_PATH: &str = "/etc/apt/sources.list";

/// Default location of apt's downloaded package lists.
pub const PACKAGE_LISTS_DIR: &str = "/var/lib/apt/lists";

/// Package whose `apt-cache show` output is used to check for package lists.
pub const PACKAGE_LISTS_PROBE_PACKAGE: &str = "python3";

// Package manager commands
/// Refreshes the package lists
pub const APT_GET_COMMAND: &str = "apt-get";
/// Queries the package lists
pub const APT_CACHE_COMMAND: &str = "apt-cache";
/// Reports the package architecture
pub const DPKG_COMMAND: &str = "dpkg";

/// Location of the os-release file used to detect the host's identity.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

// Retry strategy (smart update)
/// Initial delay in milliseconds before the first `apt-get update` retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 30;
/// Default maximum number of `apt-get update` attempts (including the first)
pub const MAX_UPDATE_ATTEMPTS: usize = 10;

