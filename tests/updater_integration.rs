//! End-to-end tests of the updater facade.
//!
//! Mirror lists come from an in-process fetcher, mirrors themselves are
//! `wiremock` servers probed over real HTTP.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use apt_mirror_updater::backends::{debian, ubuntu};
use apt_mirror_updater::http::HttpFetcher;
use apt_mirror_updater::initialization::init_client;
use apt_mirror_updater::system::HostIdentityProbe;
use apt_mirror_updater::{
    AptMirrorUpdater, Collaborators, Config, DistributorId, ResolutionError, UpdaterError,
};

use helpers::{debian_mirror_list, ubuntu_mirror_list, FixedIdentity, RecordingExecutor, RouteFetcher};

const RELEASE_SIGNATURE: &str = "-----BEGIN PGP SIGNATURE-----\n\niQIzBAABCAAdFiEE\n-----END PGP SIGNATURE-----\n";
const INRELEASE: &str = "-----BEGIN PGP SIGNED MESSAGE-----\nHash: SHA512\n\nOrigin: Debian\n";
const KEYRING: &str = "Ubuntu Archive Automatic Signing Key (2018) <ftpmaster@ubuntu.com>";

fn config(distributor_id: &str, codename: &str, architecture: &str, dir: &std::path::Path) -> Config {
    Config {
        distributor_id: Some(distributor_id.to_string()),
        distribution_codename: Some(codename.to_string()),
        architecture: Some(architecture.to_string()),
        probe_timeout_seconds: 1,
        sources_list_path: dir.join("sources.list"),
        package_lists_dir: dir.join("lists"),
        max_update_attempts: 2,
        ..Default::default()
    }
}

fn probe_fetcher(config: &Config) -> Arc<HttpFetcher> {
    let client = init_client(config).expect("Failed to build HTTP client");
    Arc::new(HttpFetcher::new(client, config.probe_timeout()))
}

fn mirror_url(server: &MockServer, suffix: &str) -> String {
    format!("{}/{}", server.uri(), suffix)
}

#[tokio::test]
async fn test_debian_ranking_over_http() {
    // Passes on the first stable resource, probed exactly once
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/debian/dists/stable/Release.gpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RELEASE_SIGNATURE))
        .expect(1)
        .mount(&primary)
        .await;

    // Denies the first resource, passes on the fallback
    let fallback = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/debian/dists/stable/Release.gpg"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&fallback)
        .await;
    Mock::given(method("GET"))
        .and(path("/debian/dists/stable/InRelease"))
        .respond_with(ResponseTemplate::new(200).set_body_string(INRELEASE))
        .mount(&fallback)
        .await;

    // Answers everything with a generic page
    let parked = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Welcome to nginx!</html>"))
        .mount(&parked)
        .await;

    // Too slow to answer within the probe timeout
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(RELEASE_SIGNATURE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&slow)
        .await;

    let servers = [&primary, &fallback, &parked, &slow];
    let bases: Vec<String> = servers.iter().map(|s| s.uri()).collect();
    let fetcher = Arc::new(RouteFetcher::new().route(debian::MIRRORS_URL, debian_mirror_list(&bases)));

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config("debian", "bookworm", "amd64", dir.path());
    let updater = AptMirrorUpdater::with_collaborators(
        config.clone(),
        Collaborators {
            fetcher: fetcher.clone(),
            probe_fetcher: probe_fetcher(&config),
            executor: Arc::new(RecordingExecutor::new()),
            identity: Arc::new(FixedIdentity::new("debian", "bookworm", "amd64")),
        },
    )
    .await
    .expect("construction should succeed");

    let ranked: Vec<String> = updater
        .ranked_mirrors()
        .await
        .expect("ranking should succeed")
        .iter()
        .map(|c| c.mirror_url.clone())
        .collect();

    assert_eq!(ranked.len(), 3, "parked mirror must be dropped: {:?}", ranked);
    assert!(!ranked.contains(&mirror_url(&parked, "debian")));
    // Timed out probes stay available but have no latency, so they sort last
    assert_eq!(ranked[2], mirror_url(&slow, "debian"));
    let mut fastest_two = ranked[..2].to_vec();
    fastest_two.sort();
    let mut expected = vec![mirror_url(&primary, "debian"), mirror_url(&fallback, "debian")];
    expected.sort();
    assert_eq!(fastest_two, expected);

    let slow_candidate = updater
        .available_mirrors()
        .await
        .expect("memoized")
        .iter()
        .find(|c| c.mirror_url == mirror_url(&slow, "debian"))
        .cloned()
        .expect("slow mirror is available");
    assert!(slow_candidate.latency.is_none());

    // Memoized results: the mirror list is fetched once, `primary` probed once
    let best = updater.best_mirror().await.expect("best mirror");
    assert_eq!(best, ranked[0]);
    assert_eq!(fetcher.hits(debian::MIRRORS_URL), 1);
    assert!(updater.ranker().stats().inconclusive() >= 1);
}

#[tokio::test]
async fn test_debian_change_mirror_round_trip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config("debian", "bookworm", "amd64", dir.path());
    let sources_list = dir.path().join("sources.list");
    std::fs::write(&sources_list, "deb http://deb.debian.org/debian bookworm main\n")
        .expect("write sources.list");

    let updater = AptMirrorUpdater::with_collaborators(
        config,
        Collaborators {
            fetcher: Arc::new(RouteFetcher::new()),
            probe_fetcher: Arc::new(RouteFetcher::new()),
            executor: Arc::new(RecordingExecutor::new()),
            identity: Arc::new(FixedIdentity::new("debian", "bookworm", "amd64")),
        },
    )
    .await
    .expect("construction should succeed");

    assert_eq!(
        updater.current_mirror().await.expect("current mirror"),
        "http://deb.debian.org/debian"
    );
    updater
        .change_mirror("https://ftp.nl.debian.org/debian")
        .await
        .expect("change should succeed");

    let text = std::fs::read_to_string(&sources_list).expect("read sources.list");
    assert!(text.contains(
        "deb https://ftp.nl.debian.org/debian bookworm main contrib non-free non-free-firmware"
    ));
    assert!(text.contains("bookworm-security"));
    assert_eq!(
        updater.current_mirror().await.expect("current mirror"),
        "https://ftp.nl.debian.org/debian"
    );
    let backup = std::fs::read_to_string(dir.path().join("sources.list.save")).expect("backup");
    assert!(backup.contains("deb.debian.org"));
}

#[tokio::test]
async fn test_ubuntu_smart_update_recovers_from_broken_mirror() {
    let broken = MockServer::start().await;
    let healthy = MockServer::start().await;
    for server in [&broken, &healthy] {
        Mock::given(method("GET"))
            .and(path("/ubuntu/project/ubuntu-archive-keyring.gpg"))
            .respond_with(ResponseTemplate::new(200).set_body_string(KEYRING))
            .mount(server)
            .await;
    }
    let broken_url = mirror_url(&broken, "ubuntu");
    let healthy_url = mirror_url(&healthy, "ubuntu");

    let mirror_list = ubuntu_mirror_list(&[
        (broken.uri(), "Up to date"),
        (healthy.uri(), "One hour behind"),
    ]);
    let fetcher = Arc::new(RouteFetcher::new().route(ubuntu::MIRRORS_URL, mirror_list));
    let executor = Arc::new(RecordingExecutor::new().script(
        "apt-get update",
        100,
        &format!(
            "Err:3 {}/ noble/main amd64 Packages\n  Hash Sum mismatch\n\
             E: Failed to fetch {}/dists/noble/main/binary-amd64/Packages.xz  Hash Sum mismatch\n",
            broken_url, broken_url
        ),
    ));

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config("ubuntu", "noble", "amd64", dir.path());
    std::fs::write(
        dir.path().join("sources.list"),
        format!("deb {} noble main restricted\n", broken_url),
    )
    .expect("write sources.list");

    let updater = AptMirrorUpdater::with_collaborators(
        config.clone(),
        Collaborators {
            fetcher,
            probe_fetcher: probe_fetcher(&config),
            executor: executor.clone(),
            identity: Arc::new(FixedIdentity::new("ubuntu", "noble", "amd64")),
        },
    )
    .await
    .expect("construction should succeed");

    updater.smart_update().await.expect("second attempt succeeds");

    assert_eq!(executor.calls(), vec!["apt-get update", "apt-get update"]);
    assert_eq!(updater.current_mirror().await.expect("current mirror"), healthy_url);
}

#[tokio::test]
async fn test_identity_detection_selects_ports_archive() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let os_release = dir.path().join("os-release");
    std::fs::write(
        &os_release,
        "PRETTY_NAME=\"Ubuntu 24.04.1 LTS\"\nNAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n\
         VERSION_ID=\"24.04\"\nVERSION_CODENAME=noble\nUBUNTU_CODENAME=noble\n",
    )
    .expect("write os-release");

    let executor = Arc::new(RecordingExecutor::new().script(
        "dpkg --print-architecture",
        0,
        "arm64\n",
    ));
    let fetcher = Arc::new(RouteFetcher::new());
    let mut config = config("ubuntu", "noble", "amd64", dir.path());
    config.distributor_id = None;
    config.distribution_codename = None;
    config.architecture = None;

    let updater = AptMirrorUpdater::with_collaborators(
        config,
        Collaborators {
            fetcher: fetcher.clone(),
            probe_fetcher: fetcher.clone(),
            executor: executor.clone(),
            identity: Arc::new(HostIdentityProbe::with_os_release_path(
                executor.clone(),
                &os_release,
            )),
        },
    )
    .await
    .expect("construction should succeed");

    assert_eq!(updater.distributor_id(), DistributorId::Ubuntu);
    assert_eq!(updater.release().series, "noble");
    assert_eq!(updater.architecture(), "arm64");
    assert_eq!(updater.best_mirror().await.expect("best mirror"), ubuntu::PORTS_URL);
    assert_eq!(fetcher.hits(ubuntu::MIRRORS_URL), 0);
    assert_eq!(executor.calls(), vec!["dpkg --print-architecture"]);
}

#[tokio::test]
async fn test_no_available_mirror() {
    let dead = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&dead)
        .await;

    let fetcher = Arc::new(
        RouteFetcher::new().route(debian::MIRRORS_URL, debian_mirror_list(&[dead.uri()])),
    );
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config("debian", "bookworm", "amd64", dir.path());
    let updater = AptMirrorUpdater::with_collaborators(
        config.clone(),
        Collaborators {
            fetcher,
            probe_fetcher: probe_fetcher(&config),
            executor: Arc::new(RecordingExecutor::new()),
            identity: Arc::new(FixedIdentity::new("debian", "bookworm", "amd64")),
        },
    )
    .await
    .expect("construction should succeed");

    let err = updater.best_mirror().await.expect_err("no mirror passes");
    assert!(matches!(
        err,
        UpdaterError::Resolution(ResolutionError::NoMirrorAvailable { .. })
    ));
}
