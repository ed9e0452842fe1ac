//! HTTP client initialization.
//!
//! This module provides the function that builds the shared HTTP client used
//! for mirror list fetches and mirror probes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the HTTP client with default settings.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the configuration
/// - Overall timeout from the mirror list fetch timeout
/// - TCP connect timeout of `TCP_CONNECT_TIMEOUT_SECS`
/// - Redirect following enabled (up to 10 hops, reqwest's default)
///
/// Individual requests narrow the timeout further, see `crate::http::HttpFetcher`.
///
/// # Arguments
///
/// * `config` - Configuration containing user-agent and timeout settings
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(config.fetch_timeout())
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}
