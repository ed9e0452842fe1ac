//! The updater facade.
//!
//! `AptMirrorUpdater` ties the pieces together for one host: it resolves the
//! release once at construction, then lazily discovers, probes and ranks
//! mirrors, memoizing each step. On top of that it exposes the operations
//! that touch the system: reading and rewriting the package source
//! configuration and refreshing the package lists.

mod diagnose;


use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::OnceCell;

use crate::backends::{backend_for, MirrorBackend, MirrorCandidate};
use crate::config::{Config, APT_CACHE_COMMAND, APT_GET_COMMAND, PACKAGE_LISTS_PROBE_PACKAGE};
use crate::error_handling::{
    get_retry_strategy, CommandError, InitializationError, ResolutionError, UpdaterError,
};
use crate::http::{Fetcher, HttpFetcher};
use crate::initialization::init_client;
use crate::ranking::{available_mirrors, best_mirror, preselect_mirrors, rank_mirrors, MirrorRanker};
use crate::releases::{coerce_release_for, DistributorId, Release};
use crate::sources::find_current_mirror;
use crate::system::{
    CommandExecutor, CommandOutput, HostIdentityProbe, IdentityProbe, SystemExecutor,
    SystemIdentity,
};

pub use diagnose::{diagnose_update_output, UpdateFailure};

/// External collaborators of the updater.
///
/// [`AptMirrorUpdater::new`] wires up the real ones; tests inject fakes
/// through [`AptMirrorUpdater::with_collaborators`].
pub struct Collaborators {
    /// Fetches mirror lists
    pub fetcher: Arc<dyn Fetcher>,
    /// Fetches stable resources while probing mirrors
    pub probe_fetcher: Arc<dyn Fetcher>,
    /// Runs `apt-get` and `apt-cache`
    pub executor: Arc<dyn CommandExecutor>,
    /// Fills in identity fields missing from the configuration
    pub identity: Arc<dyn IdentityProbe>,
}

/// Mirror selection and package list maintenance for one host.
///
/// The distributor, release and architecture are fixed at construction.
/// `discovered_mirrors`, `available_mirrors` and `ranked_mirrors` are computed
/// on first use and memoized for the lifetime of the updater.
pub struct AptMirrorUpdater {
    config: Config,
    distributor_id: DistributorId,
    release: Release,
    architecture: String,
    backend: &'static dyn MirrorBackend,
    fetcher: Arc<dyn Fetcher>,
    executor: Arc<dyn CommandExecutor>,
    ranker: MirrorRanker,
    discovered: OnceCell<Vec<MirrorCandidate>>,
    available: OnceCell<Vec<MirrorCandidate>>,
    ranked: OnceCell<Vec<MirrorCandidate>>,
}

impl AptMirrorUpdater {
    /// Creates an updater using the host's HTTP stack, commands and identity.
    ///
    /// Identity fields missing from `config` are detected from the running
    /// system.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built, the identity can't
    /// be detected, the distributor isn't supported or the release is unknown.
    pub async fn new(config: Config) -> Result<Self, UpdaterError> {
        let client = init_client(&config).map_err(InitializationError::from)?;
        let fetcher = HttpFetcher::new(client, config.fetch_timeout());
        let probe_fetcher = fetcher.with_timeout(config.probe_timeout());
        let executor: Arc<dyn CommandExecutor> = Arc::new(SystemExecutor);
        let identity = Arc::new(HostIdentityProbe::new(Arc::clone(&executor)));

        Self::with_collaborators(
            config,
            Collaborators {
                fetcher: Arc::new(fetcher),
                probe_fetcher: Arc::new(probe_fetcher),
                executor,
                identity,
            },
        )
        .await
    }

    /// Creates an updater with explicit collaborators.
    ///
    /// # Errors
    ///
    /// Same as [`AptMirrorUpdater::new`], minus HTTP client construction.
    pub async fn with_collaborators(
        config: Config,
        collaborators: Collaborators,
    ) -> Result<Self, UpdaterError> {
        let needs_detection = config.distributor_id.is_none()
            || config.distribution_codename.is_none()
            || config.architecture.is_none();
        let detected = if needs_detection {
            Some(collaborators.identity.detect().await?)
        } else {
            None
        };

        let distributor_text = identity_field(&config.distributor_id, detected.as_ref(), |d| {
            &d.distributor_id
        })?;
        let codename = identity_field(&config.distribution_codename, detected.as_ref(), |d| {
            &d.codename
        })?;
        let architecture =
            identity_field(&config.architecture, detected.as_ref(), |d| &d.architecture)?;

        let distributor_id = distributor_text
            .parse::<DistributorId>()
            .map_err(|_| ResolutionError::UnsupportedDistributor(distributor_text.clone()))?;
        let release = coerce_release_for(distributor_id, codename.as_str())?;
        info!(
            "Using {} on {} ({})",
            release,
            architecture,
            release.identifier()
        );

        let ranker = MirrorRanker::new(
            collaborators.probe_fetcher,
            config.probe_timeout(),
            config.max_concurrency,
        );
        Ok(AptMirrorUpdater {
            distributor_id,
            release,
            architecture,
            backend: backend_for(distributor_id),
            fetcher: collaborators.fetcher,
            executor: collaborators.executor,
            ranker,
            discovered: OnceCell::new(),
            available: OnceCell::new(),
            ranked: OnceCell::new(),
            config,
        })
    }

    /// Distributor the updater works for.
    pub fn distributor_id(&self) -> DistributorId {
        self.distributor_id
    }

    /// Release resolved at construction.
    pub fn release(&self) -> &Release {
        &self.release
    }

    /// Package architecture, as `dpkg --print-architecture` reports it.
    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// The ranker, with its probe cache and statistics.
    pub fn ranker(&self) -> &MirrorRanker {
        &self.ranker
    }

    /// Checks whether the release is end-of-life today.
    pub fn release_is_eol(&self) -> bool {
        self.release.is_eol()
    }

    /// The archive used instead of discovered mirrors, if any.
    ///
    /// End-of-life releases are only available from the old releases archive,
    /// and some architectures only from a ports archive. Neither is probed.
    fn fixed_archive(&self) -> Option<&'static str> {
        if self.release_is_eol() {
            Some(self.backend.old_releases_url())
        } else {
            self.backend.ports_url(&self.architecture)
        }
    }

    /// Candidate mirrors, before probing.
    ///
    /// # Errors
    ///
    /// Returns `UpdaterError::Fetch` when the mirror list can't be fetched.
    pub async fn discovered_mirrors(&self) -> Result<&[MirrorCandidate], UpdaterError> {
        let mirrors = self
            .discovered
            .get_or_try_init(|| async {
                if let Some(url) = self.fixed_archive() {
                    info!("Using {} as the only mirror for {}", url, self.release);
                    let distributor_id =
                        self.release.upstream_distributor_id.unwrap_or(self.distributor_id);
                    return Ok::<_, UpdaterError>(vec![MirrorCandidate::new(url, distributor_id)]);
                }
                let candidates = self.backend.discover_mirrors(self.fetcher.as_ref()).await?;
                Ok::<_, UpdaterError>(preselect_mirrors(
                    candidates,
                    &self.config.exclude,
                    self.config.max_mirrors,
                ))
            })
            .await?;
        Ok(mirrors)
    }

    /// Mirrors that passed validation, in declaration order.
    pub async fn available_mirrors(&self) -> Result<&[MirrorCandidate], UpdaterError> {
        let mirrors = self
            .available
            .get_or_try_init(|| async {
                let discovered = self.discovered_mirrors().await?.to_vec();
                let probed = if self.fixed_archive().is_some() {
                    discovered
                        .into_iter()
                        .map(|mut candidate| {
                            candidate.is_available = true;
                            candidate
                        })
                        .collect()
                } else {
                    self.ranker
                        .probe_mirrors(discovered, self.backend.stable_resources())
                        .await
                };
                Ok::<_, UpdaterError>(available_mirrors(&probed))
            })
            .await?;
        Ok(mirrors)
    }

    /// Available mirrors, best first.
    pub async fn ranked_mirrors(&self) -> Result<&[MirrorCandidate], UpdaterError> {
        let mirrors = self
            .ranked
            .get_or_try_init(|| async {
                let available = self.available_mirrors().await?.to_vec();
                Ok::<_, UpdaterError>(rank_mirrors(available))
            })
            .await?;
        Ok(mirrors)
    }

    /// URL of the best available mirror.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::NoMirrorAvailable` when no mirror passed validation.
    pub async fn best_mirror(&self) -> Result<String, UpdaterError> {
        let ranked = self.ranked_mirrors().await?;
        let best = best_mirror(ranked, self.distributor_id)?;
        Ok(best.mirror_url.clone())
    }

    /// Renders package source configuration for `mirror_url`.
    ///
    /// End-of-life releases always point at the old releases archive.
    pub fn generate_sources_list(&self, mirror_url: &str) -> String {
        let old_releases = self.backend.old_releases_url();
        let mirror_url = if self.release_is_eol() && mirror_url != old_releases {
            warn!(
                "{} is end-of-life, using {} instead of {}",
                self.release, old_releases, mirror_url
            );
            old_releases
        } else {
            mirror_url
        };
        self.backend.generate_sources_list(mirror_url, &self.release)
    }

    /// Mirror currently configured in the package source configuration.
    ///
    /// # Errors
    ///
    /// Returns `UpdaterError::Io` when the file can't be read and
    /// `ResolutionError::CurrentMirrorUnknown` when it has no matching `deb` line.
    pub async fn current_mirror(&self) -> Result<String, UpdaterError> {
        let path = &self.config.sources_list_path;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| UpdaterError::Io {
                path: path.clone(),
                source,
            })?;
        find_current_mirror(&text, self.release.archive_series()).ok_or_else(|| {
            ResolutionError::CurrentMirrorUnknown { path: path.clone() }.into()
        })
    }

    /// Rewrites the package source configuration to use `new_mirror`.
    ///
    /// The previous content is kept next to it with a `.save` suffix.
    pub async fn change_mirror(&self, new_mirror: &str) -> Result<(), UpdaterError> {
        let content = self.generate_sources_list(new_mirror);
        self.install_sources_list(&content, new_mirror).await
    }

    /// Runs `apt-get update` once.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Failed` when `apt-get` exits with a non-zero status.
    pub async fn dumb_update(&self) -> Result<CommandOutput, UpdaterError> {
        info!("Updating package lists ..");
        let output = self.executor.execute(APT_GET_COMMAND, &["update"]).await?;
        if !output.success() {
            return Err(CommandError::Failed {
                command: format!("{} update", APT_GET_COMMAND),
                exit_code: output.exit_code,
                output: output.output,
            }
            .into());
        }
        Ok(output)
    }

    /// Updates package lists, working around mirror problems.
    ///
    /// Makes sure the configured mirror passes validation first (switching to
    /// the best mirror when it doesn't), then runs `apt-get update` up to
    /// `max_update_attempts` times with exponential backoff. Between attempts
    /// the output decides what changes. Only failures naming the current
    /// mirror count; other repositories (PPAs, vendor archives) never cause
    /// a switch. Missing release files switch to the old releases archive
    /// once the release is confirmed gone from the mirror. Other mirror
    /// failures switch to the next ranked mirror that wasn't tried yet.
    ///
    /// # Errors
    ///
    /// Returns `UpdaterError::UpdateFailed` when every attempt failed.
    pub async fn smart_update(&self) -> Result<(), UpdaterError> {
        let mut current = match self.current_mirror().await {
            Ok(url) => url,
            Err(UpdaterError::Resolution(ResolutionError::CurrentMirrorUnknown { .. })) => {
                let best = self.best_mirror().await?;
                self.change_mirror(&best).await?;
                best
            }
            Err(e) => return Err(e),
        };
        if !self.mirror_is_usable(&current).await {
            let best = self.best_mirror().await?;
            if best != current {
                warn!("Current mirror {} failed validation, switching to {}", current, best);
                self.change_mirror(&best).await?;
                current = best;
            }
        }

        let max_attempts = self.config.max_update_attempts.max(1);
        let mut delays = get_retry_strategy(max_attempts);
        let mut tried = HashSet::from([current.clone()]);
        let mut attempts = 0;

        let last_output = loop {
            attempts += 1;
            info!("Updating package lists (attempt {}/{}) ..", attempts, max_attempts);
            let output = self.executor.execute(APT_GET_COMMAND, &["update"]).await?;
            let failure = diagnose_update_output(&output.output, &current);
            if output.success() && failure.is_none() {
                info!("Package lists updated using {}", current);
                return Ok(());
            }
            warn!(
                "{} update failed with exit code {} ({:?})",
                APT_GET_COMMAND, output.exit_code, failure
            );

            match failure {
                Some(UpdateFailure::ReleaseMissing)
                    if current != self.backend.old_releases_url() =>
                {
                    if self.release_left_mirror(&current).await {
                        let old_releases = self.backend.old_releases_url();
                        warn!("Release files are missing, switching to {}", old_releases);
                        // The release itself may not be end-of-life yet, so
                        // bypass the redirect in generate_sources_list
                        let content =
                            self.backend.generate_sources_list(old_releases, &self.release);
                        self.install_sources_list(&content, old_releases).await?;
                        current = old_releases.to_string();
                        tried.insert(current.clone());
                    } else {
                        warn!(
                            "{} still serves {}, keeping it",
                            current,
                            self.release.archive_series()
                        );
                    }
                }
                Some(UpdateFailure::MirrorBroken) => {
                    if let Some(next) = self.next_untried_mirror(&tried).await? {
                        warn!("Switching from {} to {}", current, next);
                        self.change_mirror(&next).await?;
                        tried.insert(next.clone());
                        current = next;
                    }
                }
                _ => {}
            }

            match delays.next() {
                Some(delay) => {
                    debug!("Retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
                None => break output.output,
            }
        };

        Err(UpdaterError::UpdateFailed {
            attempts,
            output: last_output,
        })
    }

    /// Removes downloaded package lists, keeping apt's lock file and `partial/`.
    ///
    /// Returns the number of files removed.
    pub async fn clear_package_lists(&self) -> Result<usize, UpdaterError> {
        let dir = &self.config.package_lists_dir;
        info!("Clearing package lists in {} ..", dir.display());
        let io_error = |source| UpdaterError::Io {
            path: dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let name = entry.file_name();
            if name == "lock" || name == "partial" {
                continue;
            }
            let file_type = entry.file_type().await.map_err(io_error)?;
            if file_type.is_file() || file_type.is_symlink() {
                let path = entry.path();
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|source| UpdaterError::Io { path, source })?;
                removed += 1;
            }
        }
        info!("Removed {} package list files", removed);
        Ok(removed)
    }

    /// Checks whether apt has package lists, by asking `apt-cache` about a
    /// package every release carries.
    pub async fn have_package_lists(&self) -> Result<bool, UpdaterError> {
        let output = self
            .executor
            .execute(APT_CACHE_COMMAND, &["show", PACKAGE_LISTS_PROBE_PACKAGE])
            .await?;
        Ok(output.output.contains("Filename:"))
    }

    /// Validates a mirror; fixed archives are trusted without probing.
    async fn mirror_is_usable(&self, mirror_url: &str) -> bool {
        if self.fixed_archive() == Some(mirror_url) {
            return true;
        }
        self.ranker
            .validate(mirror_url, self.backend.stable_resources())
            .await
            .is_available()
    }

    /// Whether the release is gone from `mirror_url`.
    ///
    /// True for end-of-life releases. Otherwise the mirror must fail to serve
    /// the release signature; an inconclusive probe keeps the mirror.
    async fn release_left_mirror(&self, mirror_url: &str) -> bool {
        if self.release_is_eol() {
            return true;
        }
        !self
            .ranker
            .has_release(mirror_url, self.release.archive_series())
            .await
            .is_available()
    }

    /// Best ranked mirror not in `tried`.
    async fn next_untried_mirror(
        &self,
        tried: &HashSet<String>,
    ) -> Result<Option<String>, UpdaterError> {
        let ranked = match self.ranked_mirrors().await {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!("Can't rank mirrors to switch to: {}", e);
                return Ok(None);
            }
        };
        Ok(ranked
            .iter()
            .map(|candidate| &candidate.mirror_url)
            .find(|url| !tried.contains(*url))
            .cloned())
    }

    /// Replaces the package source configuration, keeping a `.save` backup.
    async fn install_sources_list(&self, content: &str, mirror_url: &str) -> Result<(), UpdaterError> {
        let path = &self.config.sources_list_path;
        match tokio::fs::read(path).await {
            Ok(previous) => {
                let backup = backup_path(path);
                debug!("Saving {} to {}", path.display(), backup.display());
                tokio::fs::write(&backup, previous)
                    .await
                    .map_err(|source| UpdaterError::Io {
                        path: backup.clone(),
                        source,
                    })?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(UpdaterError::Io {
                    path: path.clone(),
                    source,
                })
            }
        }

        tokio::fs::write(path, content)
            .await
            .map_err(|source| UpdaterError::Io {
                path: path.clone(),
                source,
            })?;
        info!("Changed mirror of {} to {}", self.release, mirror_url);
        Ok(())
    }
}

fn identity_field(
    explicit: &Option<String>,
    detected: Option<&SystemIdentity>,
    field: impl Fn(&SystemIdentity) -> &String,
) -> Result<String, InitializationError> {
    explicit
        .clone()
        .or_else(|| detected.map(|d| field(d).clone()))
        .ok_or_else(|| InitializationError::IdentityError("identity not detected".to_string()))
}

/// `/etc/apt/sources.list` -> `/etc/apt/sources.list.save`
fn backup_path(path: &Path) -> PathBuf {
    let mut backup = OsString::from(path.as_os_str());
    backup.push(".save");
    PathBuf::from(backup)
}
