//! Error type definitions.
//!
//! This module defines all error types used throughout the crate, plus the
//! categories used to classify failed mirror probes.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The host's distributor, codename or architecture couldn't be detected.
    #[error("System identity detection error: {0}")]
    IdentityError(String),
}

/// Nothing in the catalog or the mirror list matches what was asked for.
///
/// These errors are always surfaced to the caller; nothing is ever silently
/// defaulted in their place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No known release matches the given codename, series or version.
    #[error("Release not found: no known release matches {query:?}")]
    ReleaseNotFound { query: String },

    /// More than one known release matches the given input.
    #[error("Ambiguous release {query:?}: matches {}", matches.join(", "))]
    AmbiguousRelease { query: String, matches: Vec<String> },

    /// The distributor id isn't one of the supported distributors.
    #[error("Unsupported distributor: {0:?}")]
    UnsupportedDistributor(String),

    /// Ranking produced an empty list of available mirrors.
    #[error("No mirror available for {distributor}")]
    NoMirrorAvailable { distributor: String },

    /// The package source configuration doesn't reference a mirror for the release.
    #[error("Failed to determine the current mirror from {}", path.display())]
    CurrentMirrorUnknown { path: PathBuf },
}

/// Errors reported by a [`Fetcher`](crate::http::Fetcher).
///
/// Timeouts are kept distinguishable from every other transport error because
/// the mirror probing policy treats them differently.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request didn't complete within its time budget.
    #[error("Timeout while fetching {url}")]
    Timeout { url: String },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP status {status} while fetching {url}")]
    Status { url: String, status: u16 },

    /// Connection, TLS, protocol or body error.
    #[error("Transport error while fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: ReqwestError,
    },

    /// The response body exceeded `MAX_RESPONSE_BODY_SIZE`.
    #[error("Response from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    /// The URL couldn't be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// Returns true when the fetch failed because it ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    /// The URL that was being fetched.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::BodyTooLarge { url, .. }
            | FetchError::InvalidUrl { url } => url,
        }
    }
}

/// A single malformed entry in a mirror list.
///
/// Entries that fail to parse are logged and skipped; they never abort discovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorEntryError {
    /// The entry's link isn't a valid absolute URL.
    #[error("Invalid mirror URL {href:?}: {reason}")]
    InvalidUrl { href: String, reason: String },

    /// The entry's link uses a scheme that can't be probed.
    #[error("Unsupported scheme in mirror URL {href:?}")]
    UnsupportedScheme { href: String },

    /// The mirror status string isn't one of the known values.
    #[error("Unrecognized mirror status {text:?}")]
    UnknownStatus { text: String },
}

/// Errors from running external package manager commands.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program couldn't be started at all.
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited with a non-zero status.
    #[error("Command `{command}` failed with exit code {exit_code}")]
    Failed {
        command: String,
        exit_code: i32,
        output: String,
    },
}

/// Top level error returned by the updater facade.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// Release or mirror resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The mirror list couldn't be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A system command couldn't run or failed
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Setup of the HTTP client or host identity failed
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// Reading or writing a local file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `apt-get update` kept failing after every allowed attempt.
    #[error("Failed to update package lists after {attempts} attempts")]
    UpdateFailed { attempts: usize, output: String },
}

/// Categories of failed mirror probes.
///
/// Used for statistics only: a probe either verifies a mirror, is inconclusive
/// (timeout), or fails with one of these categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ProbeErrorType {
    /// The request timed out
    HttpRequestTimeoutError,
    /// The connection couldn't be established
    HttpRequestConnectError,
    /// The request couldn't be built or sent
    HttpRequestRequestError,
    /// The response body couldn't be read
    HttpRequestBodyError,
    /// Too many redirects, or a redirect loop
    HttpRequestRedirectError,
    /// Any other transport failure
    HttpRequestOtherError,
    /// 403, usually access control on the probe path
    HttpRequestForbidden,
    /// 404
    HttpRequestNotFound,
    /// 5xx
    HttpRequestServerError,
    /// Any other non-2xx status
    HttpRequestOtherStatus,
    /// The body exceeded the size limit
    BodyTooLarge,
    /// The mirror URL is malformed
    InvalidUrl,
    /// Served something, but not the expected marker
    UnexpectedContent,
}

impl std::fmt::Display for ProbeErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProbeErrorType {
    /// Human readable label used in logs and the probe summary.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeErrorType::HttpRequestTimeoutError => "HTTP request timeout",
            ProbeErrorType::HttpRequestConnectError => "HTTP request connect error",
            ProbeErrorType::HttpRequestRequestError => "HTTP request error",
            ProbeErrorType::HttpRequestBodyError => "HTTP request body error",
            ProbeErrorType::HttpRequestRedirectError => "HTTP request redirect error",
            ProbeErrorType::HttpRequestOtherError => "HTTP request other error",
            ProbeErrorType::HttpRequestForbidden => "Forbidden (403)",
            ProbeErrorType::HttpRequestNotFound => "Not Found (404)",
            ProbeErrorType::HttpRequestServerError => "Server error (5xx)",
            ProbeErrorType::HttpRequestOtherStatus => "Other HTTP status",
            ProbeErrorType::BodyTooLarge => "Response body too large",
            ProbeErrorType::InvalidUrl => "Invalid URL",
            ProbeErrorType::UnexpectedContent => "Unexpected content",
        }
    }
}
