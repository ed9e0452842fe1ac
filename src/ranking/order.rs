//! Candidate ordering and pre-selection.

use std::time::Duration;

use glob::{MatchOptions, Pattern};
use log::{debug, warn};

use crate::backends::MirrorCandidate;

/// Sort key for an optional signal: known values first, smallest first.
fn signal_key(signal: Option<Duration>) -> (bool, Duration) {
    (signal.is_none(), signal.unwrap_or(Duration::ZERO))
}

/// Orders probed candidates best-first.
///
/// Keys, in order: available before unavailable, smaller source-reported lag,
/// smaller probe latency. Candidates without a signal go after those with
/// one. The sort is stable, so ties keep their declaration order.
pub fn rank_mirrors(mut candidates: Vec<MirrorCandidate>) -> Vec<MirrorCandidate> {
    candidates.sort_by_key(|candidate| {
        (
            !candidate.is_available,
            signal_key(candidate.lag),
            signal_key(candidate.latency),
        )
    });
    candidates
}

/// Exclude patterns match the whole URL, ignoring case; `*` crosses `/`.
const EXCLUDE_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiles the exclude globs, skipping invalid ones.
fn compile_excludes(exclude: &[String]) -> Vec<Pattern> {
    exclude
        .iter()
        .filter_map(|pattern| match Pattern::new(pattern) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                None
            }
        })
        .collect()
}

/// Narrows discovered candidates down to the ones worth probing.
///
/// Drops candidates whose URL matches one of the `exclude` globs, then keeps
/// at most `max_mirrors` candidates, preferring the freshest ones according
/// to the mirror list. The result keeps declaration order.
pub fn preselect_mirrors(
    candidates: Vec<MirrorCandidate>,
    exclude: &[String],
    max_mirrors: usize,
) -> Vec<MirrorCandidate> {
    let patterns = compile_excludes(exclude);
    let remaining: Vec<MirrorCandidate> = candidates
        .into_iter()
        .filter(|candidate| {
            let excluded = patterns
                .iter()
                .any(|pattern| pattern.matches_with(&candidate.mirror_url, EXCLUDE_MATCH_OPTIONS));
            if excluded {
                debug!("Excluding mirror {}", candidate.mirror_url);
            }
            !excluded
        })
        .collect();

    if remaining.len() <= max_mirrors {
        return remaining;
    }

    debug!(
        "Limiting {} candidates to the {} freshest",
        remaining.len(),
        max_mirrors
    );
    let mut indices: Vec<usize> = (0..remaining.len()).collect();
    indices.sort_by_key(|&i| signal_key(remaining[i].lag));
    indices.truncate(max_mirrors);
    indices.sort_unstable();

    let mut keep = vec![false; remaining.len()];
    for i in indices {
        keep[i] = true;
    }
    remaining
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, keep)| keep.then_some(candidate))
        .collect()
}
