//! The `Config` struct and the logging options it carries.
//!
//! `Config` is shared by the library and the binary: library users build it
//! with struct update syntax, the binary parses it from the command line.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::config::constants::{
    DEFAULT_USER_AGENT, FETCH_TIMEOUT_SECS, MAX_MIRRORS, MAX_UPDATE_ATTEMPTS, PACKAGE_LISTS_DIR,
    PROBE_TIMEOUT_SECS, SEMAPHORE_LIMIT, SOURCES_LIST_PATH,
};

/// Minimum severity of log records that are written.
///
/// `Info` reports mirror changes and ranking summaries, `Debug` adds every
/// probe result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Failures only
    Error,
    /// Failures and skipped mirror entries, inconclusive probes
    Warn,
    /// Progress and mirror changes
    #[default]
    Info,
    /// Individual probe results
    Debug,
    /// Everything, including dependency internals
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Shape of log output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Coloured lines for a terminal
    #[default]
    Plain,
    /// One JSON object per line, for log collectors
    Json,
}

/// Updater configuration.
///
/// Identity fields left as `None` are detected from the host when the
/// updater is created.
///
/// # Examples
///
/// ```no_run
/// use apt_mirror_updater::Config;
///
/// let config = Config {
///     distributor_id: Some("ubuntu".to_string()),
///     distribution_codename: Some("noble".to_string()),
///     max_concurrency: 10,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "apt-mirror-updater",
    version,
    about = "Automated, robust apt mirror selection for Debian, Ubuntu and derivatives"
)]
pub struct Config {
    /// Distributor id (debian, ubuntu, elementary). Detected from the host when omitted.
    #[arg(long = "distributor-id")]
    pub distributor_id: Option<String>,

    /// Release codename, series or version number. Detected from the host when omitted.
    #[arg(long = "codename")]
    pub distribution_codename: Option<String>,

    /// Architecture (amd64, arm64, ...). Detected from the host when omitted.
    #[arg(long)]
    pub architecture: Option<String>,

    /// Per-probe timeout in seconds (timeouts don't disqualify a mirror)
    #[arg(long, default_value_t = PROBE_TIMEOUT_SECS)]
    pub probe_timeout_seconds: u64,

    /// Timeout for fetching mirror lists in seconds
    #[arg(long, default_value_t = FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_seconds: u64,

    /// Maximum concurrent mirror probes
    #[arg(long, default_value_t = SEMAPHORE_LIMIT)]
    pub max_concurrency: usize,

    /// Maximum number of discovered mirrors to rank
    #[arg(short = 'm', long, default_value_t = MAX_MIRRORS)]
    pub max_mirrors: usize,

    /// Glob pattern of mirror URLs to ignore (can be repeated)
    #[arg(short = 'x', long)]
    pub exclude: Vec<String>,

    /// User-Agent sent with mirror list fetches and probes
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Package source configuration file that is read and rewritten
    #[arg(long, default_value = SOURCES_LIST_PATH)]
    pub sources_list_path: PathBuf,

    /// Directory containing apt's downloaded package lists
    #[arg(long, default_value = PACKAGE_LISTS_DIR)]
    pub package_lists_dir: PathBuf,

    /// Maximum number of `apt-get update` attempts made by a smart update
    #[arg(long, default_value_t = MAX_UPDATE_ATTEMPTS)]
    pub max_update_attempts: usize,

    /// Minimum level of log records to write
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Plain text or JSON lines
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Config {
    /// Per-probe timeout as a `Duration`.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    /// Mirror list fetch timeout as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distributor_id: None,
            distribution_codename: None,
            architecture: None,
            probe_timeout_seconds: PROBE_TIMEOUT_SECS,
            fetch_timeout_seconds: FETCH_TIMEOUT_SECS,
            max_concurrency: SEMAPHORE_LIMIT,
            max_mirrors: MAX_MIRRORS,
            exclude: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sources_list_path: PathBuf::from(SOURCES_LIST_PATH),
            package_lists_dir: PathBuf::from(PACKAGE_LISTS_DIR),
            max_update_attempts: MAX_UPDATE_ATTEMPTS,
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
        }
    }
}
