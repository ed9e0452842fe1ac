//! Mirror discovery backends.
//!
//! One backend per upstream distributor family. Each backend module exposes
//! the same free-standing surface:
//! - `discover_mirrors(fetcher)`: fetch and parse the distributor's mirror list
//! - `generate_sources_list(mirror_url, release)`: package source configuration text
//! - `OLD_RELEASES_URL` and `SECURITY_URL`: fixed archive endpoints
//! - `STABLE_RESOURCES`: the paths probed to validate a mirror
//!
//! Derivative distributors re-export their upstream's surface (see
//! [`elementary`]) and only bring their own release table. The
//! [`MirrorBackend`] trait gives the updater uniform access to all of them.

pub mod debian;
pub mod elementary;
mod parse;
pub mod ubuntu;


use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::error_handling::{FetchError, MirrorEntryError};
use crate::http::Fetcher;
use crate::releases::{DistributorId, Release};

/// Maximum length of a mirror URL taken from a mirror list.
const MAX_URL_LENGTH: usize = 2048;

/// A path below a mirror's base URL that exists on every genuine mirror and
/// whose content contains a known marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableResource {
    /// Path relative to the mirror's base URL, starting with `/`
    pub path: &'static str,
    /// Byte sequence the response must contain
    pub marker: &'static [u8],
}

/// One discovered mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorCandidate {
    /// Normalized base URL, never with a trailing slash
    pub mirror_url: String,
    /// Distributor whose archive the mirror replicates
    pub distributor_id: DistributorId,
    /// Result of probing; false until the candidate has been probed
    pub is_available: bool,
    /// Status reported by the mirror list, e.g. `Two hours behind`
    pub status: Option<String>,
    /// How far the mirror lags behind the primary archive, as reported by the
    /// mirror list. `None` when the list carries no freshness signal.
    pub lag: Option<Duration>,
    /// Time taken by the successful validation probe
    pub latency: Option<Duration>,
}

impl MirrorCandidate {
    /// A candidate without any ranking signal.
    pub fn new(mirror_url: impl Into<String>, distributor_id: DistributorId) -> Self {
        MirrorCandidate {
            mirror_url: mirror_url.into(),
            distributor_id,
            is_available: false,
            status: None,
            lag: None,
            latency: None,
        }
    }

    /// Whether the mirror is served over HTTPS.
    pub fn is_https(&self) -> bool {
        self.mirror_url.starts_with("https://")
    }
}

/// Uniform access to a distributor's discovery and validation logic.
#[async_trait]
pub trait MirrorBackend: Send + Sync {
    /// Distributor whose releases this backend serves.
    fn distributor_id(&self) -> DistributorId;

    /// The distributor's bundled release table.
    fn known_releases(&self) -> &'static [Release];

    /// Archive of releases that reached end-of-life.
    fn old_releases_url(&self) -> &'static str;

    /// Archive of security updates.
    fn security_url(&self) -> &'static str;

    /// Stable resources checked, in order, when validating a mirror.
    fn stable_resources(&self) -> &'static [StableResource];

    /// Archive used instead of discovered mirrors on architectures that the
    /// regular mirrors don't carry.
    fn ports_url(&self, architecture: &str) -> Option<&'static str> {
        let _ = architecture;
        None
    }

    /// Fetches and parses the distributor's mirror list.
    async fn discover_mirrors(
        &self,
        fetcher: &dyn Fetcher,
    ) -> Result<Vec<MirrorCandidate>, FetchError>;

    /// Renders package source configuration pointing at `mirror_url`.
    fn generate_sources_list(&self, mirror_url: &str, release: &Release) -> String;
}

/// Returns the backend of a supported distributor.
pub fn backend_for(distributor_id: DistributorId) -> &'static dyn MirrorBackend {
    match distributor_id {
        DistributorId::Debian => &debian::DebianBackend,
        DistributorId::Ubuntu => &ubuntu::UbuntuBackend,
        DistributorId::Elementary => &elementary::ElementaryBackend,
    }
}

/// Normalizes a mirror URL taken from a mirror list.
///
/// Trims whitespace, requires an absolute `http` or `https` URL and strips
/// trailing slashes, so `http://mirror.example/ubuntu/` and
/// `http://mirror.example/ubuntu` compare equal.
///
/// # Errors
///
/// Returns a `MirrorEntryError` when the URL can't be parsed, is too long or
/// uses another scheme.
pub fn normalize_mirror_url(href: &str) -> Result<String, MirrorEntryError> {
    let href = href.trim();
    if href.len() > MAX_URL_LENGTH {
        return Err(MirrorEntryError::InvalidUrl {
            href: href.chars().take(50).collect(),
            reason: format!("longer than {} characters", MAX_URL_LENGTH),
        });
    }

    let parsed = url::Url::parse(href).map_err(|e| MirrorEntryError::InvalidUrl {
        href: href.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => {
            return Err(MirrorEntryError::UnsupportedScheme {
                href: href.to_string(),
            })
        }
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Drops candidates whose URL was already seen, keeping the first occurrence.
pub(crate) fn dedup_candidates(candidates: Vec<MirrorCandidate>) -> Vec<MirrorCandidate> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.mirror_url.clone()))
        .collect()
}

/// Logs a skipped mirror list entry.
pub(crate) fn log_skipped_entry(source: &str, error: &MirrorEntryError) {
    warn!("Skipping malformed entry in mirror list {}: {}", source, error);
}
