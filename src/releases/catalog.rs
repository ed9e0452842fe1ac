//! Bundled release tables.
//!
//! The tables use the `distro-info` CSV layout (`version,codename,series,created`
//! plus an `lts` flag). Derivative tables add the upstream columns. Each table
//! is parsed once, on first use, into an immutable `Vec<Release>`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{DistributorId, Release, ReleaseVersion};

/// Debian releases, buzz through forky plus sid.
pub(crate) static DEBIAN_RELEASES: LazyLock<Vec<Release>> =
    LazyLock::new(|| parse_catalog(DistributorId::Debian, include_str!("data/debian.csv")));

/// Ubuntu releases, warty through resolute.
pub(crate) static UBUNTU_RELEASES: LazyLock<Vec<Release>> =
    LazyLock::new(|| parse_catalog(DistributorId::Ubuntu, include_str!("data/ubuntu.csv")));

#[derive(Debug, Deserialize)]
struct CatalogRow {
    version: Option<String>,
    codename: String,
    series: String,
    created: String,
    #[serde(default)]
    lts: bool,
    #[serde(default)]
    upstream_distributor_id: Option<String>,
    #[serde(default)]
    upstream_series: Option<String>,
    #[serde(default)]
    upstream_version: Option<String>,
}

/// Parses a release table for one distributor.
///
/// Rows that fail to parse (bad date, bad version, unknown upstream
/// distributor) are logged and skipped; the rest of the table is kept.
pub fn parse_catalog(distributor_id: DistributorId, csv_text: &str) -> Vec<Release> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let mut releases = Vec::new();
    for (index, row) in reader.deserialize::<CatalogRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::error!(
                    "Skipping malformed {} release table row {}: {}",
                    distributor_id,
                    index + 1,
                    e
                );
                continue;
            }
        };
        match release_from_row(distributor_id, row) {
            Ok(release) => releases.push(release),
            Err(reason) => log::error!(
                "Skipping invalid {} release table row {}: {}",
                distributor_id,
                index + 1,
                reason
            ),
        }
    }
    releases
}

fn release_from_row(distributor_id: DistributorId, row: CatalogRow) -> Result<Release, String> {
    let created_date = NaiveDate::parse_from_str(&row.created, "%Y-%m-%d")
        .map_err(|e| format!("invalid created date {:?}: {}", row.created, e))?;
    let version = parse_optional_version(row.version.as_deref())?;
    let upstream_version = parse_optional_version(row.upstream_version.as_deref())?;
    let upstream_distributor_id = match non_empty(row.upstream_distributor_id.as_deref()) {
        Some(id) => Some(
            id.parse::<DistributorId>()
                .map_err(|_| format!("unknown upstream distributor {:?}", id))?,
        ),
        None => None,
    };

    Ok(Release {
        codename: row.codename,
        series: row.series,
        version,
        created_date,
        distributor_id,
        is_lts: row.lts,
        upstream_distributor_id,
        upstream_series: non_empty(row.upstream_series.as_deref()).map(str::to_string),
        upstream_version,
    })
}

fn parse_optional_version(text: Option<&str>) -> Result<Option<ReleaseVersion>, String> {
    non_empty(text)
        .map(|t| t.parse::<ReleaseVersion>().map_err(|e| e.to_string()))
        .transpose()
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
