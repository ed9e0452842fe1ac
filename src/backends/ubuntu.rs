//! Ubuntu mirror discovery.

use async_trait::async_trait;
use log::{debug, info};

use super::parse::parse_ubuntu_mirror_list;
use super::{dedup_candidates, log_skipped_entry, MirrorBackend, MirrorCandidate, StableResource};
use crate::error_handling::FetchError;
use crate::http::Fetcher;
use crate::releases::{DistributorId, Release, UBUNTU_RELEASES};

/// The Launchpad listing of official Ubuntu archive mirrors.
pub const MIRRORS_URL: &str = "https://launchpad.net/ubuntu/+archivemirrors";

/// Archive of Ubuntu releases that reached end-of-life.
pub const OLD_RELEASES_URL: &str = "http://old-releases.ubuntu.com/ubuntu";

/// Archive of Ubuntu security updates.
pub const SECURITY_URL: &str = "http://security.ubuntu.com/ubuntu";

/// Archive serving every architecture except `amd64` and `i386`.
pub const PORTS_URL: &str = "http://ports.ubuntu.com/ubuntu-ports";

/// Resources checked to validate an Ubuntu mirror, in order.
///
/// Some mirrors deny access to the keyring below `/project`, so the release
/// signature of the development series is checked as well.
pub const STABLE_RESOURCES: &[StableResource] = &[
    StableResource {
        path: "/project/ubuntu-archive-keyring.gpg",
        marker: b"ftpmaster@ubuntu.com",
    },
    StableResource {
        path: "/dists/devel/Release.gpg",
        marker: b"-----BEGIN PGP SIGNATURE-----",
    },
];

const COMPONENTS: &str = "main restricted universe multiverse";

/// Architectures carried by the regular archive and its mirrors.
const PRIMARY_ARCHITECTURES: &[&str] = &["amd64", "i386"];

/// Returns [`PORTS_URL`] when `architecture` isn't carried by the regular archive.
pub fn ports_url_for(architecture: &str) -> Option<&'static str> {
    (!PRIMARY_ARCHITECTURES.contains(&architecture)).then_some(PORTS_URL)
}

/// Discovers Ubuntu mirrors from Launchpad.
///
/// Malformed entries are logged and skipped.
///
/// # Errors
///
/// Returns the `FetchError` when the mirror list itself can't be fetched.
pub async fn discover_mirrors(fetcher: &dyn Fetcher) -> Result<Vec<MirrorCandidate>, FetchError> {
    info!("Discovering Ubuntu mirrors using {} ..", MIRRORS_URL);
    let body = fetcher.fetch(MIRRORS_URL).await?;
    let html = String::from_utf8_lossy(&body);

    let mut candidates = Vec::new();
    for entry in parse_ubuntu_mirror_list(&html) {
        match entry {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => log_skipped_entry(MIRRORS_URL, &e),
        }
    }
    let candidates = dedup_candidates(candidates);
    info!("Discovered {} Ubuntu mirrors", candidates.len());
    Ok(candidates)
}

/// Generates `sources.list` content for an Ubuntu release.
///
/// Derivative releases are written with the Ubuntu series they are based on,
/// since that's the suite their archive publishes. The old-releases and ports
/// archives serve the security suite themselves.
pub fn generate_sources_list(mirror_url: &str, release: &Release) -> String {
    let mirror_url = mirror_url.trim_end_matches('/');
    let series = release.archive_series();
    let security_url = if mirror_url == OLD_RELEASES_URL || mirror_url == PORTS_URL {
        mirror_url
    } else {
        SECURITY_URL
    };
    debug!("Generating Ubuntu sources.list for {} using {}", series, mirror_url);

    [
        format!("deb {} {} {}", mirror_url, series, COMPONENTS),
        format!("deb {} {}-updates {}", mirror_url, series, COMPONENTS),
        format!("deb {} {}-backports {}", mirror_url, series, COMPONENTS),
        format!("deb {} {}-security {}", security_url, series, COMPONENTS),
        String::new(),
    ]
    .join("\n")
}

/// Ubuntu backend.
pub struct UbuntuBackend;

#[async_trait]
impl MirrorBackend for UbuntuBackend {
    fn distributor_id(&self) -> DistributorId {
        DistributorId::Ubuntu
    }

    fn known_releases(&self) -> &'static [Release] {
        &UBUNTU_RELEASES
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

    fn ports_url(&self, architecture: &str) -> Option<&'static str> {
        ports_url_for(architecture)
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
