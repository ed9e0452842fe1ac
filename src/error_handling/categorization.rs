//! Error categorization and retry strategy.
//!
//! This module provides functions to categorize probe failures and configure
//! the backoff used between `apt-get update` attempts.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::{FetchError, ProbeErrorType};

/// Creates an exponential backoff retry strategy.
///
/// Returns a retry strategy configured with:
/// - Initial delay: `RETRY_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `RETRY_FACTOR` (doubles delay each retry)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
///
/// The iterator yields `max_attempts - 1` delays, one before each retry, so
/// that together with the initial attempt at most `max_attempts` attempts are
/// made.
pub fn get_retry_strategy(max_attempts: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR) // Double the delay with each retry
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .take(max_attempts.saturating_sub(1))
}

/// Categorizes a `reqwest::Error` into a `ProbeErrorType`.
pub(crate) fn categorize_reqwest_error(error: &reqwest::Error) -> ProbeErrorType {
    if let Some(status) = error.status() {
        return categorize_status(status.as_u16());
    }

    if error.is_timeout() {
        ProbeErrorType::HttpRequestTimeoutError
    } else if error.is_connect() {
        ProbeErrorType::HttpRequestConnectError
    } else if error.is_redirect() {
        ProbeErrorType::HttpRequestRedirectError
    } else if error.is_body() || error.is_decode() {
        ProbeErrorType::HttpRequestBodyError
    } else if error.is_request() {
        ProbeErrorType::HttpRequestRequestError
    } else {
        ProbeErrorType::HttpRequestOtherError
    }
}

/// Categorizes a `FetchError` into a `ProbeErrorType`.
///
/// This is the unified categorization used by the probe statistics and the
/// probe log messages.
pub fn categorize_fetch_error(error: &FetchError) -> ProbeErrorType {
    match error {
        FetchError::Timeout { .. } => ProbeErrorType::HttpRequestTimeoutError,
        FetchError::Status { status, .. } => categorize_status(*status),
        FetchError::Transport { source, .. } => categorize_reqwest_error(source),
        FetchError::BodyTooLarge { .. } => ProbeErrorType::BodyTooLarge,
        FetchError::InvalidUrl { .. } => ProbeErrorType::InvalidUrl,
    }
}

fn categorize_status(status: u16) -> ProbeErrorType {
    match status {
        403 => ProbeErrorType::HttpRequestForbidden,
        404 => ProbeErrorType::HttpRequestNotFound,
        500..=599 => ProbeErrorType::HttpRequestServerError,
        _ => ProbeErrorType::HttpRequestOtherStatus,
    }
}
