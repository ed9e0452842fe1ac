//! Mirror ranking.
//!
//! This module provides:
//! - Mirror validation against stable resources (`probe`)
//! - A per-pass probe result cache (`cache`)
//! - Deterministic ordering and pre-selection of candidates (`order`)
//! - `MirrorRanker`: concurrent probing of many candidates
//!
//! Ranking is all-or-nothing: every candidate is probed before anything is
//! sorted, so the order never depends on which probe finished first.

mod cache;
mod order;
mod probe;


use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::info;

use crate::backends::{MirrorCandidate, StableResource};
use crate::error_handling::{ProbeStats, ResolutionError};
use crate::http::Fetcher;
use crate::initialization::init_semaphore;
use crate::releases::DistributorId;

// Re-export public API
pub use cache::ProbeCache;
pub use order::{preselect_mirrors, rank_mirrors};
pub use probe::{contains_marker, ProbeOutcome};

/// Probes mirror candidates concurrently.
///
/// Owns the probe cache and the statistics of one ranking pass. The number of
/// probes in flight is bounded by a semaphore.
pub struct MirrorRanker {
    fetcher: Arc<dyn Fetcher>,
    cache: ProbeCache,
    stats: Arc<ProbeStats>,
    probe_timeout: Duration,
    max_concurrency: usize,
}

impl MirrorRanker {
    /// Creates a ranker.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher used for probes
    /// * `probe_timeout` - Time budget of one probe; exceeding it is inconclusive, not a failure
    /// * `max_concurrency` - Maximum number of probes in flight
    pub fn new(fetcher: Arc<dyn Fetcher>, probe_timeout: Duration, max_concurrency: usize) -> Self {
        MirrorRanker {
            fetcher,
            cache: ProbeCache::new(),
            stats: Arc::new(ProbeStats::new()),
            probe_timeout,
            max_concurrency,
        }
    }

    /// Outcomes of the probes run so far.
    pub fn cache(&self) -> &ProbeCache {
        &self.cache
    }

    /// Counters of the probes run so far.
    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    /// Validates one mirror against `resources`, see [`ProbeOutcome`].
    pub async fn validate(&self, base_url: &str, resources: &[StableResource]) -> ProbeOutcome {
        probe::validate_mirror(
            self.fetcher.as_ref(),
            &self.cache,
            &self.stats,
            base_url,
            resources,
            self.probe_timeout,
        )
        .await
    }

    /// Checks whether a mirror still serves the signed release file of `series`.
    ///
    /// Releases disappear from regular mirrors once they move to the old
    /// releases archive.
    pub async fn has_release(&self, base_url: &str, series: &str) -> ProbeOutcome {
        probe::probe_path(
            self.fetcher.as_ref(),
            &self.cache,
            &self.stats,
            base_url,
            &format!("/dists/{}/Release.gpg", series),
            probe::RELEASE_SIGNATURE_MARKER,
            self.probe_timeout,
        )
        .await
    }

    /// Probes every candidate and records the results on it.
    ///
    /// Sets `is_available` and `latency` on each candidate. The returned
    /// candidates are in the same order as the input.
    pub async fn probe_mirrors(
        &self,
        mut candidates: Vec<MirrorCandidate>,
        resources: &[StableResource],
    ) -> Vec<MirrorCandidate> {
        info!("Checking {} mirrors for availability ..", candidates.len());
        let semaphore = init_semaphore(self.max_concurrency);
        let mut tasks = FuturesUnordered::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let base_url = candidate.mirror_url.as_str();
            tasks.push(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire().await.ok();
                (index, self.validate(base_url, resources).await)
            });
        }

        let mut outcomes = vec![None; candidates.len()];
        while let Some((index, outcome)) = tasks.next().await {
            outcomes[index] = Some(outcome);
        }
        drop(tasks);

        for (candidate, outcome) in candidates.iter_mut().zip(outcomes) {
            if let Some(outcome) = outcome {
                candidate.is_available = outcome.is_available();
                candidate.latency = outcome.latency();
            }
        }

        let available = candidates.iter().filter(|c| c.is_available).count();
        info!(
            "Found {} available mirrors out of {}",
            available,
            candidates.len()
        );
        self.stats.log_summary();
        candidates
    }
}

/// Keeps the candidates whose probe succeeded, in declaration order.
pub fn available_mirrors(probed: &[MirrorCandidate]) -> Vec<MirrorCandidate> {
    probed.iter().filter(|c| c.is_available).cloned().collect()
}

/// Returns the first ranked mirror.
///
/// # Errors
///
/// Returns `ResolutionError::NoMirrorAvailable` when `ranked` is empty.
pub fn best_mirror(
    ranked: &[MirrorCandidate],
    distributor_id: DistributorId,
) -> Result<&MirrorCandidate, ResolutionError> {
    ranked.first().ok_or(ResolutionError::NoMirrorAvailable {
        distributor: distributor_id.to_string(),
    })
}
