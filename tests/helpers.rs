// Shared test helpers: in-process collaborators and mirror list builders.
//
// This module provides fakes for the updater's collaborators so the facade can
// be exercised through the public API without touching the host.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use apt_mirror_updater::http::Fetcher;
use apt_mirror_updater::system::{CommandExecutor, CommandOutput, IdentityProbe, SystemIdentity};
use apt_mirror_updater::{CommandError, FetchError, InitializationError};

/// Serves fixed bodies by URL; everything else is a 404.
#[derive(Default)]
pub struct RouteFetcher {
    routes: HashMap<String, Vec<u8>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl RouteFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(url.to_string(), body.into());
        self
    }

    #[allow(dead_code)] // Used by other test files
    pub fn hits(&self, url: &str) -> usize {
        self.hits
            .lock()
            .expect("lock")
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for RouteFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        *self
            .hits
            .lock()
            .expect("lock")
            .entry(url.to_string())
            .or_default() += 1;
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Replays scripted command outputs and records every command line.
///
/// Commands without a scripted output succeed with empty output.
#[derive(Default)]
pub struct RecordingExecutor {
    scripted: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, command_line: &str, exit_code: i32, output: &str) -> Self {
        self.scripted
            .lock()
            .expect("lock")
            .entry(command_line.to_string())
            .or_default()
            .push_back(CommandOutput {
                exit_code,
                output: output.to_string(),
            });
        self
    }

    #[allow(dead_code)] // Used by other test files
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().expect("lock").push(command_line.clone());
        let scripted = self
            .scripted
            .lock()
            .expect("lock")
            .get_mut(&command_line)
            .and_then(VecDeque::pop_front);
        Ok(scripted.unwrap_or(CommandOutput {
            exit_code: 0,
            output: String::new(),
        }))
    }
}

/// Identity probe returning a fixed identity and counting calls.
pub struct FixedIdentity {
    identity: SystemIdentity,
    calls: AtomicUsize,
}

impl FixedIdentity {
    #[allow(dead_code)] // Used by other test files
    pub fn new(distributor_id: &str, codename: &str, architecture: &str) -> Self {
        FixedIdentity {
            identity: SystemIdentity {
                distributor_id: distributor_id.to_string(),
                codename: codename.to_string(),
                architecture: architecture.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)] // Used by other test files
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProbe for FixedIdentity {
    async fn detect(&self) -> Result<SystemIdentity, InitializationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.identity.clone())
    }
}

/// Builds a Debian-style mirror list linking to `<base>/debian/` for each base URL.
#[allow(dead_code)] // Used by other test files
pub fn debian_mirror_list(bases: &[String]) -> String {
    let rows: String = bases
        .iter()
        .map(|base| {
            format!(
                "<tr><td><a rel=\"nofollow\" href=\"{base}/debian/\">{base}/debian/</a></td></tr>\n"
            )
        })
        .collect();
    format!(
        "<html><body><table border=\"0\">\n\
         <tr><td><a href=\"https://www.debian.org/mirror/\">mirror information</a></td></tr>\n\
         {rows}</table></body></html>"
    )
}

/// Builds a Launchpad-style mirror list with one HTTP mirror at `<base>/ubuntu/`
/// per `(base, status)` pair.
#[allow(dead_code)] // Used by other test files
pub fn ubuntu_mirror_list(mirrors: &[(String, &str)]) -> String {
    let rows: String = mirrors
        .iter()
        .enumerate()
        .map(|(i, (base, status))| {
            format!(
                "<tr>\
                 <td><a href=\"https://launchpad.net/ubuntu/+mirror/mirror-{i}\">Mirror {i}</a></td>\
                 <td><a href=\"{base}/ubuntu/\">http</a></td>\
                 <td>1 Gbps</td>\
                 <td><span>{status}</span></td>\
                 </tr>\n"
            )
        })
        .collect();
    format!(
        "<html><body><table id=\"mirrors_list\"><tbody>\n{rows}</tbody></table></body></html>"
    )
}
