//! Reading the mirror out of existing package source configuration.

/// Finds the mirror configured for `series` in one-line `sources.list` content.
///
/// Returns the URL of the first `deb` line whose suite is exactly `series`
/// (so `bionic-updates` and `bionic-security` lines don't count), without a
/// trailing slash. Comments and `deb-src` lines are ignored, `[option=value]`
/// blocks are skipped.
pub fn find_current_mirror(sources_list: &str, series: &str) -> Option<String> {
    sources_list.lines().find_map(|line| {
        let line = line.split('#').next().unwrap_or_default().trim();
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("deb") {
            return None;
        }
        let mut url = tokens.next()?;
        if url.starts_with('[') {
            // Options end at the first token ending with ']'
            let mut current = url;
            while !current.ends_with(']') {
                current = tokens.next()?;
            }
            url = tokens.next()?;
        }
        let suite = tokens.next()?;
        (suite == series).then(|| url.trim_end_matches('/').to_string())
    })
}
