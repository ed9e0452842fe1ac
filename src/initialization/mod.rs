//! Shared resources set up once per run: the logger, the HTTP client used
//! for mirror lists and probes, and the semaphore bounding probe concurrency.

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Semaphore with `count` permits, at least one, bounding probes in flight.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_semaphore_permits() {
        assert_eq!(init_semaphore(30).available_permits(), 30);
        assert_eq!(init_semaphore(0).available_permits(), 1);
    }
}
