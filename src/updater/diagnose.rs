//! Classification of `apt-get update` output.

/// Why an `apt-get update` run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFailure {
    /// The release files are gone from the mirror, which happens once a
    /// release moves to the old releases archive.
    ReleaseMissing,
    /// The mirror is unreachable, out of sync or serving stale metadata.
    MirrorBroken,
    /// Something unrelated to the mirror, including failures of other
    /// repositories such as PPAs.
    Other,
}

const RELEASE_MISSING_MARKERS: &[&str] = &["does not have a Release file", "no longer has a Release file"];

const MIRROR_BROKEN_MARKERS: &[&str] = &[
    "Failed to fetch",
    "Hash Sum mismatch",
    "is not valid yet",
    "is expired",
    "Could not connect to",
    "Could not resolve",
    "Temporary failure resolving",
    "Connection timed out",
];

/// Groups output lines into messages.
///
/// `apt-get` prints the details of a failed download indented below the
/// `Err:` line naming the repository, e.g. a `404  Not Found` line.
fn messages(output: &str) -> Vec<String> {
    let mut messages: Vec<String> = Vec::new();
    for line in output.lines() {
        let continuation = line.starts_with(char::is_whitespace) && !line.trim().is_empty();
        if continuation {
            if let Some(message) = messages.last_mut() {
                message.push('\n');
                message.push_str(line);
                continue;
            }
        }
        messages.push(line.to_string());
    }
    messages
}

fn names_mirror(message: &str, mirror_url: &str) -> bool {
    let mirror_url = mirror_url.trim_end_matches('/');
    message.match_indices(mirror_url).any(|(start, _)| {
        // `http://mirror.example/ubuntu` must not match `.../ubuntu-ports`
        message[start + mirror_url.len()..]
            .chars()
            .next()
            .map_or(true, |c| c == '/' || c.is_whitespace() || c == '\'')
    })
}

/// Classifies the output of an `apt-get update` run against `mirror_url`.
///
/// Only messages naming `mirror_url` can blame the mirror; failures of other
/// repositories are reported as [`UpdateFailure::Other`]. Returns `None` when
/// the output shows no failure at all. `apt-get` exits with status 0 for some
/// fetch failures, so the output is checked even for successful runs.
pub fn diagnose_update_output(output: &str, mirror_url: &str) -> Option<UpdateFailure> {
    let messages = messages(output);
    let about_mirror: Vec<&String> = messages
        .iter()
        .filter(|message| names_mirror(message, mirror_url))
        .collect();

    let release_missing = about_mirror.iter().any(|message| {
        let release_404 = message.contains("404") && message.contains("Release");
        release_404 || RELEASE_MISSING_MARKERS.iter().any(|m| message.contains(m))
    });
    if release_missing {
        return Some(UpdateFailure::ReleaseMissing);
    }
    if about_mirror
        .iter()
        .any(|message| MIRROR_BROKEN_MARKERS.iter().any(|m| message.contains(m)))
    {
        return Some(UpdateFailure::MirrorBroken);
    }
    messages
        .iter()
        .any(|message| message.starts_with("E:"))
        .then_some(UpdateFailure::Other)
}
