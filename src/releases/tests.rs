// Release catalog tests.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date in test")
}

fn version(text: &str) -> ReleaseVersion {
    text.parse().expect("valid version in test")
}

#[test]
fn test_discover_releases_counts() {
    let releases = discover_releases();
    let count = |id| releases.iter().filter(|r| r.distributor_id == id).count();
    assert!(count(DistributorId::Debian) > 10);
    assert!(count(DistributorId::Ubuntu) > 10);
    assert!(count(DistributorId::Elementary) >= 6);
    assert!(releases
        .iter()
        .any(|r| r.distributor_id == DistributorId::Debian && r.is_lts));
    assert!(releases
        .iter()
        .any(|r| r.distributor_id == DistributorId::Ubuntu && r.is_lts));
}

#[test]
fn test_discover_releases_has_no_duplicates() {
    let releases = discover_releases();
    let mut seen = HashSet::new();
    for release in &releases {
        assert!(
            seen.insert((release.distributor_id, release.series.clone())),
            "duplicate release {}",
            release.identifier()
        );
    }
    assert_eq!(releases.iter().filter(|r| r.series == "bionic").count(), 1);
    assert_eq!(releases.iter().filter(|r| r.series == "jessie").count(), 1);
}

#[test]
fn test_known_lts_releases() {
    let releases = discover_releases();
    assert!(releases.iter().any(|r| r.series == "bionic" && r.is_lts));
    assert!(releases.iter().any(|r| r.series == "stretch" && r.is_lts));
    assert!(releases.iter().any(|r| r.series == "cosmic" && !r.is_lts));
}

#[test]
fn test_coerce_release_by_series() {
    let lucid = coerce_release("lucid").expect("lucid is known");
    assert_eq!(lucid.version, Some(version("10.04")));
    assert_eq!(lucid.distributor_id, DistributorId::Ubuntu);

    let woody = coerce_release("woody").expect("woody is known");
    assert_eq!(woody.distributor_id, DistributorId::Debian);
}

#[test]
fn test_coerce_release_by_version() {
    assert_eq!(coerce_release("10.04").expect("10.04 is known").series, "lucid");
    assert_eq!(coerce_release("10.040").expect("10.040 is known").series, "lucid");
    assert_eq!(coerce_release(version("18.04")).expect("known").series, "bionic");
    assert_eq!(coerce_release(9).expect("Debian 9 is known").series, "stretch");
    assert_eq!(coerce_release("4.0").expect("Debian 4 is known").series, "etch");
}

#[test]
fn test_coerce_release_by_codename_is_case_insensitive() {
    assert_eq!(coerce_release("Lucid Lynx").expect("known").series, "lucid");
    assert_eq!(coerce_release("lucid lynx").expect("known").series, "lucid");
    assert_eq!(coerce_release("LUCID").expect("known").series, "lucid");
    assert_eq!(coerce_release("Bionic").expect("known").series, "bionic");
    assert_eq!(coerce_release("Jupiter").expect("known").series, "jupiter");
}

#[test]
fn test_coerce_release_unknown() {
    let err = coerce_release("unknown-xyz").expect_err("unknown release");
    assert_eq!(
        err,
        ResolutionError::ReleaseNotFound {
            query: "unknown-xyz".to_string()
        }
    );
    assert!(coerce_release("").is_err());
    assert!(coerce_release("99.99").is_err());
}

#[test]
fn test_coerce_release_ambiguous_version() {
    // Debian lenny and elementary Juno are both 5.0
    match coerce_release("5.0") {
        Err(ResolutionError::AmbiguousRelease { query, matches }) => {
            assert_eq!(query, "5.0");
            assert!(matches.contains(&"debian/lenny".to_string()));
            assert!(matches.contains(&"elementary/juno".to_string()));
        }
        other => panic!("expected ambiguity error, got {:?}", other),
    }
}

#[test]
fn test_coerce_release_for_distributor_resolves_ambiguity() {
    let juno = coerce_release_for(DistributorId::Elementary, "5.0").expect("known");
    assert_eq!(juno.series, "juno");
    let lenny = coerce_release_for(DistributorId::Debian, "5.0").expect("known");
    assert_eq!(lenny.series, "lenny");
    assert!(coerce_release_for(DistributorId::Debian, "bionic").is_err());
}

#[test]
fn test_series_takes_priority_over_codename() {
    let releases = parse_catalog(
        DistributorId::Debian,
        "version,codename,series,created,lts\n\
         1.0,Alpha Beta,beta,2020-01-01,false\n\
         2.0,Beta Gamma,gamma,2021-01-01,false\n",
    );
    // "beta" is the series of the first release and the codename word of the second
    let release = coerce_release_in(&releases, "beta".into()).expect("match");
    assert_eq!(release.series, "beta");
}

#[test]
fn test_eol_boundary_at_support_window() {
    let bionic = coerce_release("bionic").expect("known");
    // LTS window: 66 months after 2017-10-19
    assert_eq!(bionic.eol_date(), Some(date(2023, 4, 19)));
    assert!(!bionic.is_eol_at(date(2023, 4, 19)));
    assert!(bionic.is_eol_at(date(2023, 4, 20)));

    let cosmic = coerce_release("cosmic").expect("known");
    // Regular window: 15 months after 2018-04-26
    assert_eq!(cosmic.eol_date(), Some(date(2019, 7, 26)));
    assert!(!cosmic.is_eol_at(date(2019, 7, 26)));
    assert!(cosmic.is_eol_at(date(2019, 7, 27)));
}

#[test]
fn test_release_created_today_is_not_eol() {
    let mut release = coerce_release("noble").expect("known");
    release.created_date = today();
    release.is_lts = false;
    assert!(!release.is_eol());
}

#[test]
fn test_old_release_is_eol() {
    assert!(coerce_release("warty").expect("known").is_eol());
    assert!(coerce_release("woody").expect("known").is_eol());
}

#[test]
fn test_debian_lts_eol_date() {
    // Debian 8 LTS support ended 2020-06-30
    let jessie = coerce_release("jessie").expect("known");
    assert_eq!(jessie.is_eol(), today() >= date(2020, 6, 30));
}

#[test]
fn test_rolling_release_is_never_eol() {
    let sid = coerce_release("sid").expect("known");
    assert_eq!(sid.eol_date(), None);
    assert!(!sid.is_eol_at(date(2100, 1, 1)));
}

#[test]
fn test_derivative_inherits_upstream_eol() {
    let hera = coerce_release("hera").expect("known");
    let bionic = coerce_release("bionic").expect("known");
    assert_eq!(hera.upstream().map(|r| r.series.as_str()), Some("bionic"));
    assert_eq!(hera.eol_date(), bionic.eol_date());
}

#[test]
fn test_archive_series() {
    assert_eq!(coerce_release("hera").expect("known").archive_series(), "bionic");
    assert_eq!(coerce_release("bionic").expect("known").archive_series(), "bionic");
    assert_eq!(coerce_release("jessie").expect("known").archive_series(), "jessie");
}

#[test]
fn test_keyring_selection() {
    let lenny = coerce_release("lenny").expect("known");
    assert_eq!(lenny.keyring_file(), Some(DEBIAN_KEYRING_CURRENT));

    let precise = coerce_release("precise").expect("known");
    if ubuntu_keyring_updated() {
        assert_eq!(precise.keyring_file(), Some(UBUNTU_KEYRING_REMOVED));
    } else {
        assert_eq!(precise.keyring_file(), Some(UBUNTU_KEYRING_CURRENT));
    }

    let bionic = coerce_release("bionic").expect("known");
    assert_eq!(bionic.keyring_file(), Some(UBUNTU_KEYRING_CURRENT));
}

#[test]
fn test_keyring_rotation_threshold() {
    let precise = coerce_release("precise").expect("known");
    assert_eq!(
        keyring_file_at(&precise, date(2018, 9, 17)),
        Some(UBUNTU_KEYRING_CURRENT)
    );
    assert_eq!(
        keyring_file_at(&precise, date(2018, 9, 18)),
        Some(UBUNTU_KEYRING_REMOVED)
    );
    let quantal = coerce_release("quantal").expect("known");
    assert_eq!(
        keyring_file_at(&quantal, date(2020, 1, 1)),
        Some(UBUNTU_KEYRING_CURRENT)
    );
}

#[test]
fn test_derivative_keyring_follows_upstream_version() {
    // Luna is based on Ubuntu 12.04
    let luna = coerce_release("luna").expect("known");
    assert_eq!(
        keyring_file_at(&luna, date(2020, 1, 1)),
        Some(UBUNTU_KEYRING_REMOVED)
    );
    let hera = coerce_release("hera").expect("known");
    assert_eq!(
        keyring_file_at(&hera, date(2020, 1, 1)),
        Some(UBUNTU_KEYRING_CURRENT)
    );
}

#[test]
fn test_distributor_id_parsing() {
    assert_eq!("debian".parse::<DistributorId>().ok(), Some(DistributorId::Debian));
    assert_eq!("Ubuntu".parse::<DistributorId>().ok(), Some(DistributorId::Ubuntu));
    assert_eq!(
        "ELEMENTARY".parse::<DistributorId>().ok(),
        Some(DistributorId::Elementary)
    );
    assert!("fedora".parse::<DistributorId>().is_err());
    assert_eq!(DistributorId::Ubuntu.to_string(), "ubuntu");
}

#[test]
fn test_release_display() {
    let bionic = coerce_release("bionic").expect("known");
    assert_eq!(bionic.to_string(), "Ubuntu 18.04 (Bionic Beaver) LTS");
    let sid = coerce_release("sid").expect("known");
    assert_eq!(sid.to_string(), "Debian Sid");
}
