//! Debian mirror discovery.

use async_trait::async_trait;
use log::{debug, info};

use super::parse::parse_debian_mirror_list;
use super::{dedup_candidates, log_skipped_entry, MirrorBackend, MirrorCandidate, StableResource};
use crate::error_handling::FetchError;
use crate::http::Fetcher;
use crate::releases::{DistributorId, Release, ReleaseVersion, DEBIAN_RELEASES};

/// The official list of Debian mirrors.
pub const MIRRORS_URL: &str = "https://www.debian.org/mirror/list";

/// Archive of Debian releases that reached end-of-life.
pub const OLD_RELEASES_URL: &str = "http://archive.debian.org/debian-archive/debian";

/// Archive of Debian security updates.
pub const SECURITY_URL: &str = "http://security.debian.org/debian-security";

/// Security updates of releases that reached end-of-life.
const OLD_SECURITY_URL: &str = "http://archive.debian.org/debian-archive/debian-security";

/// Resources checked to validate a Debian mirror, in order.
pub const STABLE_RESOURCES: &[StableResource] = &[
    StableResource {
        path: "/dists/stable/Release.gpg",
        marker: b"-----BEGIN PGP SIGNATURE-----",
    },
    StableResource {
        path: "/dists/stable/InRelease",
        marker: b"-----BEGIN PGP SIGNED MESSAGE-----",
    },
];

const COMPONENTS: &str = "main contrib non-free";

/// First release that splits firmware into `non-free-firmware`.
const FIRMWARE_COMPONENT_SINCE: ReleaseVersion = ReleaseVersion::from_parts(12, 0, 0);

/// First release whose security suite is `<series>-security` instead of `<series>/updates`.
const SECURITY_SUITE_RENAMED_IN: ReleaseVersion = ReleaseVersion::from_parts(11, 0, 0);

/// Discovers Debian mirrors from the official mirror list.
///
/// Malformed entries are logged and skipped.
///
/// # Errors
///
/// Returns the `FetchError` when the mirror list itself can't be fetched.
pub async fn discover_mirrors(fetcher: &dyn Fetcher) -> Result<Vec<MirrorCandidate>, FetchError> {
    info!("Discovering Debian mirrors using {} ..", MIRRORS_URL);
    let body = fetcher.fetch(MIRRORS_URL).await?;
    let html = String::from_utf8_lossy(&body);

    let mut candidates = Vec::new();
    for entry in parse_debian_mirror_list(&html) {
        match entry {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => log_skipped_entry(MIRRORS_URL, &e),
        }
    }
    let candidates = dedup_candidates(candidates);
    info!("Discovered {} Debian mirrors", candidates.len());
    Ok(candidates)
}

/// Generates `sources.list` content for a Debian release.
///
/// Releases that reached end-of-life should be given [`OLD_RELEASES_URL`];
/// their security updates are then taken from the archive as well. Rolling
/// releases (sid) have no updates or security suites.
pub fn generate_sources_list(mirror_url: &str, release: &Release) -> String {
    let mirror_url = mirror_url.trim_end_matches('/');
    let series = &release.series;
    let components = match release.version {
        Some(version) if version >= FIRMWARE_COMPONENT_SINCE => {
            format!("{} non-free-firmware", COMPONENTS)
        }
        _ => COMPONENTS.to_string(),
    };
    debug!("Generating Debian sources.list for {} using {}", series, mirror_url);

    let mut lines = vec![format!("deb {} {} {}", mirror_url, series, components)];
    if let Some(version) = release.version {
        lines.push(format!("deb {} {}-updates {}", mirror_url, series, components));
        let security_url = if mirror_url == OLD_RELEASES_URL {
            OLD_SECURITY_URL
        } else {
            SECURITY_URL
        };
        let security_suite = if version >= SECURITY_SUITE_RENAMED_IN {
            format!("{}-security", series)
        } else {
            format!("{}/updates", series)
        };
        lines.push(format!("deb {} {} {}", security_url, security_suite, components));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Debian backend.
pub struct DebianBackend;

#[async_trait]
impl MirrorBackend for DebianBackend {
    fn distributor_id(&self) -> DistributorId {
        DistributorId::Debian
    }

    fn known_releases(&self) -> &'static [Release] {
        &DEBIAN_RELEASES
    }

    fn old_releases_url(&self) -> &'static str {
        OLD_RELEASES_URL
    }

    fn security_url(&self) -> &'static str {
        SECURITY_URL
    }

    fn stable_resources(&self) -> &'static [StableResource] {
        STABLE_RESOURCES
    }

    async fn discover_mirrors(
        &self,
        fetcher: &dyn Fetcher,
    ) -> Result<Vec<MirrorCandidate>, FetchError> {
        discover_mirrors(fetcher).await
    }

    fn generate_sources_list(&self, mirror_url: &str, release: &Release) -> String {
        generate_sources_list(mirror_url, release)
    }
}
