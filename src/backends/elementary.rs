//! Elementary OS.
//!
//! Elementary OS is built on Ubuntu and shares its archive, so mirror
//! discovery, validation and the archive endpoints are Ubuntu's. Only the
//! release table is Elementary's own; each release names the Ubuntu release
//! it is based on.

use std::sync::LazyLock;

use async_trait::async_trait;

use super::{MirrorBackend, MirrorCandidate, StableResource};
use crate::error_handling::FetchError;
use crate::http::Fetcher;
use crate::releases::{parse_catalog, DistributorId, Release};

pub use super::ubuntu::{
    discover_mirrors, generate_sources_list, ports_url_for, MIRRORS_URL, OLD_RELEASES_URL,
    PORTS_URL, SECURITY_URL, STABLE_RESOURCES,
};

const KNOWN_RELEASES_CSV: &str = "\
version,codename,series,created,lts,upstream_distributor_id,upstream_series,upstream_version
0.1,Jupiter,jupiter,2011-03-31,false,ubuntu,maverick,10.10
0.2,Luna,luna,2013-08-10,false,ubuntu,precise,12.04
0.3,Freya,freya,2015-04-11,false,ubuntu,trusty,14.04
0.4,Loki,loki,2016-09-09,false,ubuntu,xenial,16.04
5.0,Juno,juno,2018-10-16,false,ubuntu,bionic,18.04
5.1,Hera,hera,2019-12-03,false,ubuntu,bionic,18.04
6.0,Odin,odin,2021-08-10,false,ubuntu,focal,20.04
6.1,Jólnir,jolnir,2022-01-18,false,ubuntu,focal,20.04
7.0,Horus,horus,2023-01-31,false,ubuntu,jammy,22.04
8.0,Circe,circe,2024-12-19,false,ubuntu,noble,24.04
";

/// Elementary OS releases, Jupiter through Circe.
///
/// Point releases that kept their codename (Horus 7.1) share a row.
pub static KNOWN_RELEASES: LazyLock<Vec<Release>> =
    LazyLock::new(|| parse_catalog(DistributorId::Elementary, KNOWN_RELEASES_CSV));

/// Elementary OS backend, forwarding everything but the release table to Ubuntu's.
pub struct ElementaryBackend;

#[async_trait]
impl MirrorBackend for ElementaryBackend {
    fn distributor_id(&self) -> DistributorId {
        DistributorId::Elementary
    }

    fn known_releases(&self) -> &'static [Release] {
        &KNOWN_RELEASES
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
