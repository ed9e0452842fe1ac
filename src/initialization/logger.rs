//! Logger initialization.
//!
//! Plain output is meant for a terminal running the binary interactively,
//! JSON output (one object per line) for cron jobs and configuration
//! management runs whose logs are collected.

use std::io::Write;

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Dependencies whose logging is clamped regardless of the requested level.
const NOISY_MODULES: &[(&str, LevelFilter)] = &[
    ("html5ever", LevelFilter::Error),
    ("selectors", LevelFilter::Warn),
    ("reqwest", LevelFilter::Info),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
];

/// Initializes the logger with the specified level and format.
///
/// `RUST_LOG` is read first, so per-module directives still work, then
/// `level` is applied on top of it for this crate and as the global default.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Probe details for a single run
/// apt-mirror-updater --list-mirrors --log-level debug
///
/// # Machine readable logs from a cron job
/// apt-mirror-updater --smart-update --log-format json
///
/// # Debug this crate, keep reqwest quiet
/// RUST_LOG=apt_mirror_updater=debug,reqwest=warn apt-mirror-updater --best-mirror
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for (module, max_level) in NOISY_MODULES {
        builder.filter_module(module, (*max_level).min(level));
    }
    builder.filter_module("apt_mirror_updater", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(
                        chrono::Utc::now(),
                        record.level(),
                        record.target(),
                        &record.args().to_string(),
                    )
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {} {} {}",
                    chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
                    level_tag(record.level()),
                    record.target().cyan(),
                    record.args()
                )
            });
        }
    }

    builder.try_init()?;
    Ok(())
}

/// Fixed-width, coloured level tag for plain output.
fn level_tag(level: Level) -> ColoredString {
    let tag = format!("{:<5}", level);
    match level {
        Level::Error => tag.red().bold(),
        Level::Warn => tag.yellow(),
        Level::Info => tag.green(),
        Level::Debug => tag.blue(),
        Level::Trace => tag.purple(),
    }
}

fn json_line(
    timestamp: chrono::DateTime<chrono::Utc>,
    level: Level,
    target: &str,
    message: &str,
) -> String {
    serde_json::json!({
        "ts": timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "level": level.as_str(),
        "target": target,
        "msg": message,
    })
    .to_string()
}
