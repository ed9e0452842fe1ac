//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `apt_mirror_updater` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use colored::Colorize;

use apt_mirror_updater::initialization::init_logger_with;
use apt_mirror_updater::{AptMirrorUpdater, Config, MirrorCandidate};

#[derive(Debug, Parser)]
#[command(
    name = "apt-mirror-updater",
    version,
    about = "Automated, robust apt mirror selection for Debian, Ubuntu and derivatives"
)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(flatten)]
    action: Action,
}

/// Exactly one action per invocation.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Action {
    /// List the available mirrors, best first
    #[arg(short = 'l', long)]
    list_mirrors: bool,

    /// Print the URL of the best available mirror
    #[arg(short = 'b', long)]
    best_mirror: bool,

    /// Print the URL of the mirror in the package source configuration
    #[arg(short = 'f', long)]
    find_current_mirror: bool,

    /// Rewrite the package source configuration to use URL
    #[arg(short = 'c', long, value_name = "URL")]
    change_mirror: Option<String>,

    /// Rewrite the package source configuration to use the best mirror
    #[arg(short = 'a', long)]
    auto_change_mirror: bool,

    /// Run `apt-get update` once
    #[arg(short = 'u', long)]
    update: bool,

    /// Run `apt-get update`, switching mirrors when the current one is broken
    #[arg(short = 's', long)]
    smart_update: bool,

    /// Exit with status 0 when the release is end-of-life, 1 otherwise
    #[arg(long)]
    release_is_eol: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.config.log_level.into(), cli.config.log_format)
        .context("Failed to initialize logger")?;

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("apt-mirror-updater error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let updater = AptMirrorUpdater::new(cli.config)
        .await
        .context("Failed to initialize the updater")?;
    let action = cli.action;

    if action.list_mirrors {
        let ranked = updater
            .ranked_mirrors()
            .await
            .context("Failed to rank mirrors")?;
        print_mirrors(ranked);
    } else if action.best_mirror {
        println!("{}", updater.best_mirror().await?);
    } else if action.find_current_mirror {
        println!("{}", updater.current_mirror().await?);
    } else if let Some(url) = action.change_mirror {
        updater
            .change_mirror(&url)
            .await
            .with_context(|| format!("Failed to change mirror to {}", url))?;
    } else if action.auto_change_mirror {
        let best = updater.best_mirror().await?;
        updater
            .change_mirror(&best)
            .await
            .with_context(|| format!("Failed to change mirror to {}", best))?;
        println!("{} Using {}", "✓".green(), best);
    } else if action.update {
        updater.dumb_update().await?;
    } else if action.smart_update {
        updater.smart_update().await?;
        println!("{} Package lists updated", "✓".green());
    } else if action.release_is_eol {
        let eol = updater.release_is_eol();
        println!(
            "{} is {}",
            updater.release(),
            if eol { "end-of-life".red() } else { "supported".green() }
        );
        return Ok(if eol { 0 } else { 1 });
    }
    Ok(0)
}

fn print_mirrors(mirrors: &[MirrorCandidate]) {
    if mirrors.is_empty() {
        println!("No available mirrors");
        return;
    }
    println!(
        "{:>4}  {:<56} {:>14} {:>10}",
        "Rank".bold(),
        "Mirror URL".bold(),
        "Last updated".bold(),
        "Latency".bold()
    );
    for (i, mirror) in mirrors.iter().enumerate() {
        println!(
            "{:>4}  {:<56} {:>14} {:>10}",
            i + 1,
            mirror.mirror_url,
            format_lag(mirror.lag),
            mirror
                .latency
                .map(|latency| format!("{} ms", latency.as_millis()))
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn format_lag(lag: Option<Duration>) -> String {
    let Some(lag) = lag else {
        return "unknown".to_string();
    };
    let hours = lag.as_secs() / 3600;
    match hours {
        0 => "up to date".to_string(),
        1 => "1 hour ago".to_string(),
        2..=23 => format!("{} hours ago", hours),
        24..=47 => "1 day ago".to_string(),
        _ => format!("{} days ago", hours / 24),
    }
}
