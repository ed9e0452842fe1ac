//! Error handling and probe statistics.
//!
//! This module provides:
//! - Error type definitions (resolution, fetch, parse, command, updater errors)
//! - Probe failure categorization
//! - Probe statistics tracking
//! - Retry strategy configuration
//!
//! The error taxonomy follows how each failure is treated:
//! - **Resolution errors** are always surfaced to the caller
//! - **Fetch timeouts** are inconclusive when probing and never penalize a mirror
//! - **Other fetch errors** become negative probe results, or propagate unmodified
//!   when the mirror list itself can't be fetched
//! - **Mirror entry errors** skip a single malformed entry

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_fetch_error, get_retry_strategy};
pub use stats::ProbeStats;
pub use types::{
    CommandError, FetchError, InitializationError, MirrorEntryError, ProbeErrorType,
    ResolutionError, UpdaterError,
};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_probe_stats_initialization() {
        let stats = ProbeStats::new();
        for error_type in ProbeErrorType::iter() {
            assert_eq!(stats.get_error_count(error_type), 0);
        }
        assert_eq!(stats.verified(), 0);
        assert_eq!(stats.inconclusive(), 0);
        assert_eq!(stats.cache_hits(), 0);
    }

    #[test]
    fn test_probe_stats_increment() {
        let stats = ProbeStats::new();
        stats.increment_error(ProbeErrorType::HttpRequestForbidden);
        stats.increment_error(ProbeErrorType::HttpRequestForbidden);
        stats.increment_error(ProbeErrorType::UnexpectedContent);
        stats.increment_verified();
        stats.increment_inconclusive();

        assert_eq!(stats.get_error_count(ProbeErrorType::HttpRequestForbidden), 2);
        assert_eq!(stats.get_error_count(ProbeErrorType::UnexpectedContent), 1);
        assert_eq!(stats.total_errors(), 3);
        assert_eq!(stats.verified(), 1);
        assert_eq!(stats.inconclusive(), 1);
    }

    #[test]
    fn test_fetch_error_is_timeout() {
        let timeout = FetchError::Timeout {
            url: "http://mirror.example/ubuntu".to_string(),
        };
        let status = FetchError::Status {
            url: "http://mirror.example/ubuntu".to_string(),
            status: 500,
        };
        assert!(timeout.is_timeout());
        assert!(!status.is_timeout());
        assert_eq!(timeout.url(), "http://mirror.example/ubuntu");
    }

    #[test]
    fn test_resolution_error_messages() {
        let err = ResolutionError::AmbiguousRelease {
            query: "5.0".to_string(),
            matches: vec!["debian/lenny".to_string(), "elementary/juno".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("debian/lenny"));
        assert!(msg.contains("elementary/juno"));

        let err = ResolutionError::ReleaseNotFound {
            query: "unknown-xyz".to_string(),
        };
        assert!(err.to_string().contains("unknown-xyz"));
    }
}
