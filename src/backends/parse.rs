//! Mirror list parsers.
//!
//! Both parsers return one `Result` per entry they recognize, so callers can
//! log and skip malformed entries without losing the rest of the list.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use super::{normalize_mirror_url, MirrorCandidate};
use crate::error_handling::MirrorEntryError;
use crate::releases::DistributorId;

// CSS selector strings
const TABLE_ANCHOR_SELECTOR_STR: &str = "table a[href]";
const ROW_SELECTOR_STR: &str = "tr";
const CELL_SELECTOR_STR: &str = "td";
const ANCHOR_SELECTOR_STR: &str = "a[href]";

fn parse_selector_unsafe(selector: &str, context: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| {
        panic!(
            "Failed to parse CSS selector '{}' in {}: {:?}. This is a programming error.",
            selector, context, e
        )
    })
}

static TABLE_ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(TABLE_ANCHOR_SELECTOR_STR, "TABLE_ANCHOR_SELECTOR")
});
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe(ROW_SELECTOR_STR, "ROW_SELECTOR"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe(CELL_SELECTOR_STR, "CELL_SELECTOR"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe(ANCHOR_SELECTOR_STR, "ANCHOR_SELECTOR"));

/// Lag reported by Launchpad for each mirror status. `None` means the
/// status carries no freshness information.
const MIRROR_STATUSES: &[(&str, Option<Duration>)] = &[
    ("up to date", Some(Duration::ZERO)),
    ("one hour behind", Some(Duration::from_secs(60 * 60))),
    ("two hours behind", Some(Duration::from_secs(2 * 60 * 60))),
    ("four hours behind", Some(Duration::from_secs(4 * 60 * 60))),
    ("six hours behind", Some(Duration::from_secs(6 * 60 * 60))),
    ("one day behind", Some(Duration::from_secs(24 * 60 * 60))),
    ("two days behind", Some(Duration::from_secs(2 * 24 * 60 * 60))),
    ("one week behind", Some(Duration::from_secs(7 * 24 * 60 * 60))),
    ("unknown", None),
    ("last update unknown", None),
];

/// Protocol link labels in the Launchpad mirror table.
const PROTOCOL_LABELS: &[&str] = &["http", "https", "ftp", "rsync"];

/// Maps a Launchpad mirror status string to the mirror's lag.
pub(crate) fn parse_mirror_status(text: &str) -> Result<Option<Duration>, MirrorEntryError> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    MIRROR_STATUSES
        .iter()
        .find(|(label, _)| normalized.eq_ignore_ascii_case(label))
        .map(|(_, lag)| *lag)
        .ok_or_else(|| MirrorEntryError::UnknownStatus {
            text: normalized.clone(),
        })
}

/// Parses the HTML mirror list published at `https://www.debian.org/mirror/list`.
///
/// Every link inside a table that points at an absolute URL whose path ends
/// in `/debian` is a mirror entry. The list carries no freshness information.
pub(crate) fn parse_debian_mirror_list(html: &str) -> Vec<Result<MirrorCandidate, MirrorEntryError>> {
    let document = Html::parse_document(html);
    document
        .select(&TABLE_ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains("://"))
        .filter_map(|href| match normalize_mirror_url(href) {
            Ok(url) if url.ends_with("/debian") => {
                Some(Ok(MirrorCandidate::new(url, DistributorId::Debian)))
            }
            // Links to other pages of the site
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect()
}

/// Parses the HTML mirror table published at `https://launchpad.net/ubuntu/+archivemirrors`.
///
/// A row is a mirror entry when it contains at least one protocol link
/// (anchor text `http`, `https`, `ftp` or `rsync`). HTTPS is preferred over
/// HTTP for the same mirror; FTP and rsync links are never used. The status
/// in the row's last cell becomes the candidate's freshness signal.
pub(crate) fn parse_ubuntu_mirror_list(html: &str) -> Vec<Result<MirrorCandidate, MirrorEntryError>> {
    let document = Html::parse_document(html);
    document
        .select(&ROW_SELECTOR)
        .filter_map(|row| parse_ubuntu_mirror_row(&row))
        .collect()
}

fn parse_ubuntu_mirror_row(row: &ElementRef<'_>) -> Option<Result<MirrorCandidate, MirrorEntryError>> {
    let links: Vec<(String, &str)> = row
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let label = anchor.text().collect::<String>().trim().to_lowercase();
            let href = anchor.value().attr("href")?;
            PROTOCOL_LABELS
                .contains(&label.as_str())
                .then_some((label, href))
        })
        .collect();
    if links.is_empty() {
        // Header, country or navigation row
        return None;
    }

    Some(build_ubuntu_candidate(row, &links))
}

fn build_ubuntu_candidate(
    row: &ElementRef<'_>,
    links: &[(String, &str)],
) -> Result<MirrorCandidate, MirrorEntryError> {
    let pick = |protocol: &str| links.iter().find(|(label, _)| label == protocol);
    let (_, href) = match pick("https").or_else(|| pick("http")) {
        Some(link) => link,
        None => {
            return Err(MirrorEntryError::UnsupportedScheme {
                href: links[0].1.to_string(),
            })
        }
    };
    let mirror_url = normalize_mirror_url(href)?;

    let status_text = row
        .select(&CELL_SELECTOR)
        .last()
        .map(|cell| cell.text().collect::<String>())
        .unwrap_or_default();
    let lag = parse_mirror_status(&status_text)?;

    let mut candidate = MirrorCandidate::new(mirror_url, DistributorId::Ubuntu);
    candidate.status = Some(status_text.split_whitespace().collect::<Vec<_>>().join(" "));
    candidate.lag = lag;
    Ok(candidate)
}
