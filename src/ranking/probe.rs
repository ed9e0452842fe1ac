//! Mirror validation probes.
//!
//! A mirror is validated by fetching a stable resource below its base URL and
//! checking the response for a known marker. A generic 200 OK isn't enough:
//! some servers answer every path with an HTML page.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::cache::ProbeCache;
use crate::backends::StableResource;
use crate::error_handling::{categorize_fetch_error, ProbeErrorType, ProbeStats};
use crate::http::Fetcher;

/// Result of probing one stable resource, or of validating a mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The resource was served and contains the expected marker.
    Verified {
        /// Time from sending the request to checking the body
        latency: Duration,
    },
    /// The probe ran out of time. Slow mirrors aren't penalized, so this
    /// counts as available.
    Inconclusive,
    /// The resource couldn't be fetched or doesn't contain the marker.
    Failed(ProbeErrorType),
}

impl ProbeOutcome {
    /// Whether the mirror should be considered available.
    pub fn is_available(&self) -> bool {
        !matches!(self, ProbeOutcome::Failed(_))
    }

    /// Probe latency, known only for verified probes.
    pub fn latency(&self) -> Option<Duration> {
        match self {
            ProbeOutcome::Verified { latency } => Some(*latency),
            _ => None,
        }
    }
}

/// Start of the detached signature in `Release.gpg`.
pub(crate) const RELEASE_SIGNATURE_MARKER: &[u8] = b"-----BEGIN PGP SIGNATURE-----";

/// Checks whether `body` contains `marker`.
pub fn contains_marker(body: &[u8], marker: &[u8]) -> bool {
    marker.is_empty() || body.windows(marker.len()).any(|window| window == marker)
}

/// Probes `path` below a mirror's base URL, consulting the cache first.
///
/// Concurrent probes of the same `(url, path, marker)` perform a single
/// fetch. Statistics count each real fetch once and each cache hit once.
pub(crate) async fn probe_path(
    fetcher: &dyn Fetcher,
    cache: &ProbeCache,
    stats: &ProbeStats,
    base_url: &str,
    path: &str,
    marker: &[u8],
    timeout: Duration,
) -> ProbeOutcome {
    let cell = cache.cell(base_url, path, marker);
    if let Some(outcome) = cell.get() {
        stats.increment_cache_hit();
        return *outcome;
    }
    *cell
        .get_or_init(|| fetch_and_check(fetcher, stats, base_url, path, marker, timeout))
        .await
}

async fn fetch_and_check(
    fetcher: &dyn Fetcher,
    stats: &ProbeStats,
    base_url: &str,
    path: &str,
    marker: &[u8],
    timeout: Duration,
) -> ProbeOutcome {
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);
    let started = Instant::now();

    let result = match tokio::time::timeout(timeout, fetcher.fetch(&url)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Probe of {} timed out after {:?}, treating as inconclusive", url, timeout);
            stats.increment_inconclusive();
            return ProbeOutcome::Inconclusive;
        }
    };

    match result {
        Ok(body) if contains_marker(&body, marker) => {
            let latency = started.elapsed();
            debug!("Verified {} in {:?}", url, latency);
            stats.increment_verified();
            ProbeOutcome::Verified { latency }
        }
        Ok(body) => {
            warn!(
                "{} served {} bytes without the expected content",
                url,
                body.len()
            );
            stats.increment_error(ProbeErrorType::UnexpectedContent);
            ProbeOutcome::Failed(ProbeErrorType::UnexpectedContent)
        }
        Err(e) if e.is_timeout() => {
            warn!("Probe of {} timed out, treating as inconclusive", url);
            stats.increment_inconclusive();
            ProbeOutcome::Inconclusive
        }
        Err(e) => {
            let error_type = categorize_fetch_error(&e);
            warn!("Probe of {} failed ({}): {}", url, error_type, e);
            stats.increment_error(error_type);
            ProbeOutcome::Failed(error_type)
        }
    }
}

/// Validates a mirror by checking its stable resources in order.
///
/// The first resource that passes decides. When a resource fails, the next
/// one is tried, which keeps mirrors that only deny access to one path (for
/// example through a misconfigured access rule) in the running. The mirror
/// fails validation only when every resource fails; the outcome is then the
/// last failure.
pub(crate) async fn validate_mirror(
    fetcher: &dyn Fetcher,
    cache: &ProbeCache,
    stats: &ProbeStats,
    base_url: &str,
    resources: &[StableResource],
    timeout: Duration,
) -> ProbeOutcome {
    let mut outcome = ProbeOutcome::Inconclusive;
    for (index, resource) in resources.iter().enumerate() {
        outcome = probe_path(
            fetcher,
            cache,
            stats,
            base_url,
            resource.path,
            resource.marker,
            timeout,
        )
        .await;
        if outcome.is_available() {
            return outcome;
        }
        if let Some(next) = resources.get(index + 1) {
            info!(
                "{} failed the {} check, falling back to {}",
                base_url, resource.path, next.path
            );
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_marker() {
        let body = b"-----BEGIN PGP SIGNATURE-----\n\niQIzBAABCAAdFiEE\n";
        assert!(contains_marker(body, b"-----BEGIN PGP SIGNATURE-----"));
        assert!(contains_marker(b"uid ftpmaster@ubuntu.com", b"ftpmaster@ubuntu.com"));
        assert!(!contains_marker(b"<html>It works!</html>", b"ftpmaster@ubuntu.com"));
        assert!(!contains_marker(b"", b"marker"));
        assert!(contains_marker(b"anything", b""));
    }

    #[test]
    fn test_outcome_availability() {
        let verified = ProbeOutcome::Verified {
            latency: Duration::from_millis(42),
        };
        assert!(verified.is_available());
        assert_eq!(verified.latency(), Some(Duration::from_millis(42)));
        assert!(ProbeOutcome::Inconclusive.is_available());
        assert_eq!(ProbeOutcome::Inconclusive.latency(), None);
        assert!(!ProbeOutcome::Failed(ProbeErrorType::HttpRequestForbidden).is_available());
    }
}
