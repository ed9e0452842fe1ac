//! End-of-life and keyring policies.
//!
//! Both are pure functions of a release and a date: no network access and no
//! inspection of the host.

use chrono::{Months, NaiveDate};

use super::{find_release, DistributorId, Release, ReleaseVersion};

/// Keyring containing the Debian archive signing keys.
pub const DEBIAN_KEYRING_CURRENT: &str = "/usr/share/keyrings/debian-keyring.gpg";

/// Keyring containing the current Ubuntu archive signing keys.
pub const UBUNTU_KEYRING_CURRENT: &str = "/usr/share/keyrings/ubuntu-archive-keyring.gpg";

/// Keyring containing Ubuntu archive signing keys that were retired.
///
/// Releases up to 12.04 are signed with the 2004 archive key, which moved to
/// this keyring when the `ubuntu-keyring` package was updated.
pub const UBUNTU_KEYRING_REMOVED: &str = "/usr/share/keyrings/ubuntu-archive-removed-keys.gpg";

/// Date of the `ubuntu-keyring` update (2018.09.18.1) that retired the 2004 key.
const UBUNTU_KEYRING_ROTATION: (i32, u32, u32) = (2018, 9, 18);

/// How long a distributor supports its releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportPolicy {
    /// Support ends a fixed number of months after `created_date`.
    Window {
        /// Support of regular releases, in months
        regular_months: u32,
        /// Support of long term support releases, in months
        lts_months: u32,
    },
    /// Support follows the upstream release the derivative is based on.
    Upstream,
}

/// Returns the support policy of a distributor.
pub fn support_policy(distributor_id: DistributorId) -> SupportPolicy {
    match distributor_id {
        // ~2 years of development, 3 years of support, 2 more years of LTS
        DistributorId::Debian => SupportPolicy::Window {
            regular_months: 60,
            lts_months: 84,
        },
        // 6 months of development, then 9 months (regular) or 5 years (LTS)
        DistributorId::Ubuntu => SupportPolicy::Window {
            regular_months: 15,
            lts_months: 66,
        },
        DistributorId::Elementary => SupportPolicy::Upstream,
    }
}

/// Computes the date after which a release is end-of-life.
///
/// Returns `None` for rolling releases (no version number), which never reach
/// end-of-life. Derivative releases use the EOL date of the upstream release
/// they are based on; when that release isn't known the upstream
/// distributor's window is applied to the derivative's own creation date.
pub fn eol_date(release: &Release) -> Option<NaiveDate> {
    release.version?;
    match support_policy(release.distributor_id) {
        SupportPolicy::Window {
            regular_months,
            lts_months,
        } => {
            let months = if release.is_lts {
                lts_months
            } else {
                regular_months
            };
            release.created_date.checked_add_months(Months::new(months))
        }
        SupportPolicy::Upstream => {
            let upstream_id = release.upstream_distributor_id?;
            if let Some(upstream) = release
                .upstream_series
                .as_deref()
                .and_then(|series| find_release(upstream_id, series))
            {
                return eol_date(upstream);
            }
            match support_policy(upstream_id) {
                SupportPolicy::Window {
                    regular_months,
                    lts_months,
                } => {
                    let months = if release.is_lts {
                        lts_months
                    } else {
                        regular_months
                    };
                    release.created_date.checked_add_months(Months::new(months))
                }
                SupportPolicy::Upstream => None,
            }
        }
    }
}

/// Checks whether a release is end-of-life on the given date.
///
/// A release is EOL once `today` is strictly after its EOL date; on the EOL
/// date itself it is still supported.
pub fn is_eol_at(release: &Release, today: NaiveDate) -> bool {
    eol_date(release).is_some_and(|eol| today > eol)
}

struct KeyringRule {
    distributor_id: DistributorId,
    // Inclusive upper bound on the release version
    max_version: Option<ReleaseVersion>,
    effective_from: Option<(i32, u32, u32)>,
    keyring: &'static str,
}

impl KeyringRule {
    fn matches(&self, distributor_id: DistributorId, version: Option<ReleaseVersion>, today: NaiveDate) -> bool {
        if self.distributor_id != distributor_id {
            return false;
        }
        if let Some(max) = self.max_version {
            match version {
                Some(v) if v <= max => {}
                _ => return false,
            }
        }
        if let Some((y, m, d)) = self.effective_from {
            match NaiveDate::from_ymd_opt(y, m, d) {
                Some(from) if today >= from => {}
                _ => return false,
            }
        }
        true
    }
}

// First matching rule wins.
const KEYRING_RULES: &[KeyringRule] = &[
    KeyringRule {
        distributor_id: DistributorId::Debian,
        max_version: None,
        effective_from: None,
        keyring: DEBIAN_KEYRING_CURRENT,
    },
    KeyringRule {
        distributor_id: DistributorId::Ubuntu,
        max_version: Some(ReleaseVersion::from_parts(12, 4, 2)),
        effective_from: Some(UBUNTU_KEYRING_ROTATION),
        keyring: UBUNTU_KEYRING_REMOVED,
    },
    KeyringRule {
        distributor_id: DistributorId::Ubuntu,
        max_version: None,
        effective_from: None,
        keyring: UBUNTU_KEYRING_CURRENT,
    },
];

/// Selects the keyring that verifies a release's archive on the given date.
///
/// Derivatives use the keyring of their upstream release.
pub fn keyring_file_at(release: &Release, today: NaiveDate) -> Option<&'static str> {
    let (distributor_id, version) = match support_policy(release.distributor_id) {
        SupportPolicy::Upstream => (release.upstream_distributor_id?, release.upstream_version),
        SupportPolicy::Window { .. } => (release.distributor_id, release.version),
    };
    KEYRING_RULES
        .iter()
        .find(|rule| rule.matches(distributor_id, version, today))
        .map(|rule| rule.keyring)
}

/// Checks whether the Ubuntu archive keyring rotation has happened by `today`.
pub fn ubuntu_keyring_updated_at(today: NaiveDate) -> bool {
    let (y, m, d) = UBUNTU_KEYRING_ROTATION;
    NaiveDate::from_ymd_opt(y, m, d).is_some_and(|rotation| today >= rotation)
}

/// Checks whether the Ubuntu archive keyring rotation has happened.
pub fn ubuntu_keyring_updated() -> bool {
    ubuntu_keyring_updated_at(super::today())
}
