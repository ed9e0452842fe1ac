//! Probe result cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use super::probe::ProbeOutcome;

/// `(url, resource path, expected marker)`
type ProbeKey = (String, String, Vec<u8>);

/// Caches probe outcomes for one ranking pass.
///
/// Each key holds a `OnceCell`, so concurrent probes of the same resource
/// share one fetch: the first caller performs it and the others wait for its
/// outcome. Clones share the same entries.
#[derive(Clone, Default)]
pub struct ProbeCache {
    entries: Arc<Mutex<HashMap<ProbeKey, Arc<OnceCell<ProbeOutcome>>>>>,
}

impl ProbeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell for a key, creating an empty one on first use.
    pub(crate) fn cell(&self, url: &str, path: &str, marker: &[u8]) -> Arc<OnceCell<ProbeOutcome>> {
        let key = (url.to_string(), path.to_string(), marker.to_vec());
        // A poisoned lock only means another probe panicked, the map is still usable
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(entries.entry(key).or_default())
    }

    /// Returns the cached outcome for a key, if it was probed already.
    pub fn get(&self, url: &str, path: &str, marker: &[u8]) -> Option<ProbeOutcome> {
        let key = (url.to_string(), path.to_string(), marker.to_vec());
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys with a completed probe.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|cell| cell.initialized()).count()
    }

    /// Whether no probe has completed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
