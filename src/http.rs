//! URL fetching.
//!
//! The engine never talks to `reqwest` directly: discovery backends and the
//! mirror prober fetch through the [`Fetcher`] trait, which returns the body
//! bytes or a [`FetchError`] whose timeout variant is distinguishable from
//! every other failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};

use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::FetchError;

/// Fetches a URL and returns its body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, failing with `FetchError::Timeout` when the request runs
    /// out of time and with another `FetchError` variant otherwise.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url).await
    }
}

/// `Fetcher` backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Arc<reqwest::Client>,
    timeout: Duration,
}

impl HttpFetcher {
    /// Wraps a client; every request made through this fetcher is bounded by `timeout`.
    pub fn new(client: Arc<reqwest::Client>, timeout: Duration) -> Self {
        HttpFetcher { client, timeout }
    }

    /// A fetcher sharing the same client with a different time budget.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        HttpFetcher {
            client: Arc::clone(&self.client),
            timeout,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        debug!("Fetching {url}");
        // The client has its own timeout, but the request timeout here is the
        // one callers configure per use (mirror list fetch vs. probe)
        let request = async {
            let response = self
                .client
                .get(parsed)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| transport_error(url, e))?;

            let status = response.status();
            trace!("Response from {url}: {status}");
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            if response
                .content_length()
                .is_some_and(|len| len > MAX_RESPONSE_BODY_SIZE as u64)
            {
                return Err(FetchError::BodyTooLarge {
                    url: url.to_string(),
                    limit: MAX_RESPONSE_BODY_SIZE,
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| transport_error(url, e))?;
            if body.len() > MAX_RESPONSE_BODY_SIZE {
                return Err(FetchError::BodyTooLarge {
                    url: url.to_string(),
                    limit: MAX_RESPONSE_BODY_SIZE,
                });
            }
            Ok(body.to_vec())
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}
