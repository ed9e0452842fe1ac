//! Release catalog and coercion.
//!
//! This module provides:
//! - The `Release` record and the `DistributorId` enum
//! - `discover_releases()`: every known release of every supported distributor
//! - `coerce_release()`: maps a codename, series or version number to one release
//! - Derived attributes: end-of-life status and keyring selection
//!
//! The catalog is immutable reference data. Debian and Ubuntu tables are
//! bundled here, derivative tables live next to their backend in
//! `crate::backends`.

mod catalog;
mod policy;
mod version;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error_handling::ResolutionError;

pub use catalog::parse_catalog;
pub(crate) use catalog::{DEBIAN_RELEASES, UBUNTU_RELEASES};
pub use policy::{
    eol_date, is_eol_at, keyring_file_at, support_policy, ubuntu_keyring_updated,
    ubuntu_keyring_updated_at, SupportPolicy, DEBIAN_KEYRING_CURRENT, UBUNTU_KEYRING_CURRENT,
    UBUNTU_KEYRING_REMOVED,
};
pub use version::{ParseVersionError, ReleaseVersion};

/// Supported distributors.
///
/// Parsing is case-insensitive (`"Ubuntu"` and `"ubuntu"` are both accepted),
/// display is lowercase like `lsb_release -is | tr A-Z a-z`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DistributorId {
    /// Debian GNU/Linux
    Debian,
    /// Ubuntu
    Ubuntu,
    /// Elementary OS, a derivative of Ubuntu
    Elementary,
}

/// One named OS release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Human friendly name, e.g. `Bionic Beaver`
    pub codename: String,
    /// Short identifier, unique within a distributor, e.g. `bionic`
    pub series: String,
    /// Version number, absent for rolling releases like Debian sid
    pub version: Option<ReleaseVersion>,
    /// Start of development, the reference date of the support window
    pub created_date: NaiveDate,
    /// Distributor publishing the release
    pub distributor_id: DistributorId,
    /// Long term support release, with a longer support window
    pub is_lts: bool,
    /// Distributor of the release a derivative is based on
    pub upstream_distributor_id: Option<DistributorId>,
    /// Series of the upstream release, used in package source lines
    pub upstream_series: Option<String>,
    /// Version of the upstream release
    pub upstream_version: Option<ReleaseVersion>,
}

impl Release {
    /// `distributor/series`, unique across the whole catalog.
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.distributor_id, self.series)
    }

    /// Suite name used in the archive this release is installed from.
    ///
    /// Derivatives that share their upstream's archive publish under the
    /// upstream series (Elementary Hera installs from Ubuntu `bionic`).
    pub fn archive_series(&self) -> &str {
        self.upstream_series.as_deref().unwrap_or(&self.series)
    }

    /// Date after which this release is end-of-life (`None` for rolling releases).
    pub fn eol_date(&self) -> Option<NaiveDate> {
        eol_date(self)
    }

    /// Checks whether this release is end-of-life today.
    pub fn is_eol(&self) -> bool {
        self.is_eol_at(today())
    }

    /// Checks whether this release is end-of-life on the given date.
    pub fn is_eol_at(&self, today: NaiveDate) -> bool {
        is_eol_at(self, today)
    }

    /// Keyring that verifies this release's archive today.
    pub fn keyring_file(&self) -> Option<&'static str> {
        keyring_file_at(self, today())
    }

    /// The release this one is derived from, when it is in the catalog.
    pub fn upstream(&self) -> Option<&'static Release> {
        let distributor_id = self.upstream_distributor_id?;
        find_release(distributor_id, self.upstream_series.as_deref()?)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.distributor_id {
            DistributorId::Debian => "Debian",
            DistributorId::Ubuntu => "Ubuntu",
            DistributorId::Elementary => "Elementary OS",
        };
        match &self.version {
            Some(version) => write!(f, "{} {} ({})", name, version, self.codename)?,
            None => write!(f, "{} {}", name, self.codename)?,
        }
        if self.is_lts {
            write!(f, " LTS")?;
        }
        Ok(())
    }
}

/// Loose user input identifying a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseQuery {
    /// A series, codename or version number written as text.
    Text(String),
    /// A version number.
    Version(ReleaseVersion),
}

impl fmt::Display for ReleaseQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseQuery::Text(text) => f.write_str(text),
            ReleaseQuery::Version(version) => write!(f, "{}", version),
        }
    }
}

impl From<&str> for ReleaseQuery {
    fn from(text: &str) -> Self {
        ReleaseQuery::Text(text.to_string())
    }
}

impl From<String> for ReleaseQuery {
    fn from(text: String) -> Self {
        ReleaseQuery::Text(text)
    }
}

impl From<&String> for ReleaseQuery {
    fn from(text: &String) -> Self {
        ReleaseQuery::Text(text.clone())
    }
}

impl From<ReleaseVersion> for ReleaseQuery {
    fn from(version: ReleaseVersion) -> Self {
        ReleaseQuery::Version(version)
    }
}

impl From<u32> for ReleaseQuery {
    fn from(major: u32) -> Self {
        ReleaseQuery::Version(ReleaseVersion::from_parts(major, 0, 0))
    }
}

static ALL_RELEASES: LazyLock<Vec<Release>> = LazyLock::new(|| {
    let mut seen = HashSet::new();
    let mut releases = Vec::new();
    for distributor_id in DistributorId::iter() {
        for release in known_releases(distributor_id) {
            if seen.insert((release.distributor_id, release.series.clone())) {
                releases.push(release.clone());
            } else {
                log::warn!("Ignoring duplicate release {}", release.identifier());
            }
        }
    }
    releases
});

/// Returns the bundled release table of one distributor.
pub fn known_releases(distributor_id: DistributorId) -> &'static [Release] {
    crate::backends::backend_for(distributor_id).known_releases()
}

/// Returns every known release of every supported distributor.
///
/// The result contains no two releases with the same `(distributor_id, series)`.
pub fn discover_releases() -> Vec<Release> {
    ALL_RELEASES.clone()
}

/// Looks up a release by distributor and exact series.
pub fn find_release(distributor_id: DistributorId, series: &str) -> Option<&'static Release> {
    known_releases(distributor_id)
        .iter()
        .find(|release| release.series == series)
}

/// Coerces a codename, series or version number to a known release.
///
/// Matching priority:
/// 1. exact series (`"lucid"`)
/// 2. exact version number (`"10.04"`, `10.04 == 10.040`)
/// 3. case-insensitive codename, either in full (`"Lucid Lynx"`) or its
///    leading word (`"LUCID"`, `"Jupiter"`)
///
/// The first tier with any match decides. More than one match within that
/// tier is an error, never resolved silently.
///
/// # Errors
///
/// - `ResolutionError::ReleaseNotFound` when no release matches
/// - `ResolutionError::AmbiguousRelease` when several releases match
///
/// # Examples
///
/// ```
/// use apt_mirror_updater::coerce_release;
///
/// let lucid = coerce_release("lucid").unwrap();
/// assert_eq!(lucid.version.unwrap().to_string(), "10.04");
/// assert_eq!(coerce_release("10.04").unwrap().series, "lucid");
/// assert!(coerce_release("unknown-xyz").is_err());
/// ```
pub fn coerce_release(query: impl Into<ReleaseQuery>) -> Result<Release, ResolutionError> {
    coerce_release_in(&ALL_RELEASES, query.into())
}

/// Like [`coerce_release`], restricted to one distributor's releases.
///
/// Used when the distributor is already known, which also removes ambiguity
/// between version numbers shared by different distributors.
pub fn coerce_release_for(
    distributor_id: DistributorId,
    query: impl Into<ReleaseQuery>,
) -> Result<Release, ResolutionError> {
    coerce_release_in(known_releases(distributor_id), query.into())
}

fn coerce_release_in(releases: &[Release], query: ReleaseQuery) -> Result<Release, ResolutionError> {
    let query_text = query.to_string();
    let tiers: Vec<Vec<&Release>> = match &query {
        ReleaseQuery::Version(version) => vec![match_version(releases, version)],
        ReleaseQuery::Text(text) => {
            let text = text.trim();
            let by_version = text
                .parse::<ReleaseVersion>()
                .map(|version| match_version(releases, &version))
                .unwrap_or_default();
            vec![
                releases.iter().filter(|r| r.series == text).collect(),
                by_version,
                releases
                    .iter()
                    .filter(|r| codename_matches(&r.codename, text))
                    .collect(),
            ]
        }
    };

    for matches in tiers {
        match matches.as_slice() {
            [] => continue,
            [release] => {
                log::debug!("Coerced {:?} to {}", query_text, release.identifier());
                return Ok((*release).clone());
            }
            _ => {
                return Err(ResolutionError::AmbiguousRelease {
                    query: query_text,
                    matches: matches.iter().map(|r| r.identifier()).collect(),
                })
            }
        }
    }

    Err(ResolutionError::ReleaseNotFound { query: query_text })
}

fn match_version<'a>(releases: &'a [Release], version: &ReleaseVersion) -> Vec<&'a Release> {
    releases
        .iter()
        .filter(|r| r.version.as_ref() == Some(version))
        .collect()
}

fn codename_matches(codename: &str, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    codename.eq_ignore_ascii_case(text)
        || codename
            .split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case(text))
}

/// Today's date in local time.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
