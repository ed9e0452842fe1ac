//! Probe statistics tracking.
//!
//! This module provides thread-safe statistics tracking for the outcomes of
//! mirror probes during a ranking pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ProbeErrorType;

/// Thread-safe probe statistics tracker.
///
/// Tracks verified, inconclusive and failed probes using atomic counters,
/// allowing concurrent access from multiple probes. All failure categories are
/// initialized to zero on creation.
///
/// # Thread Safety
///
/// This struct is thread-safe and can be shared across concurrent probes using `Arc`.
pub struct ProbeStats {
    verified: AtomicUsize,
    inconclusive: AtomicUsize,
    cache_hits: AtomicUsize,
    errors: HashMap<ProbeErrorType, AtomicUsize>,
}

impl ProbeStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ProbeErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }

        ProbeStats {
            verified: AtomicUsize::new(0),
            inconclusive: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            errors,
        }
    }

    pub fn increment_verified(&self) {
        self.verified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_inconclusive(&self) {
        self.inconclusive.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ProbeErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment probe error counter for {:?} which is not in the map. \
                 This indicates a bug in ProbeStats initialization.",
                error
            );
        }
    }

    pub fn verified(&self) -> usize {
        self.verified.load(Ordering::SeqCst)
    }

    pub fn inconclusive(&self) -> usize {
        self.inconclusive.load(Ordering::SeqCst)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::SeqCst)
    }

    /// Get the count for an error type.
    ///
    /// Returns 0 if the error type is not in the map (should never happen if properly initialized).
    pub fn get_error_count(&self, error: ProbeErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Logs a one-line summary followed by every non-zero failure category.
    pub fn log_summary(&self) {
        log::info!(
            "Probe summary: {} verified, {} inconclusive (timeout), {} failed, {} cached",
            self.verified(),
            self.inconclusive(),
            self.total_errors(),
            self.cache_hits()
        );
        for error_type in ProbeErrorType::iter() {
            let count = self.get_error_count(error_type);
            if count > 0 {
                log::info!("   {}: {}", error_type, count);
            }
        }
    }
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self::new()
    }
}
