//! Host identity detection.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::executor::CommandExecutor;
use crate::config::{DPKG_COMMAND, OS_RELEASE_PATH};
use crate::error_handling::InitializationError;

/// Distributor, codename and architecture of a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    /// Lowercase distributor id, e.g. `ubuntu`
    pub distributor_id: String,
    /// Release series, e.g. `noble`
    pub codename: String,
    /// Debian architecture name, e.g. `amd64`
    pub architecture: String,
}

/// Detects the identity of the running system.
#[async_trait]
pub trait IdentityProbe: Send + Sync {
    /// Reads the distributor, codename and package architecture of the host.
    async fn detect(&self) -> Result<SystemIdentity, InitializationError>;
}

/// Reads `/etc/os-release` and asks `dpkg` for the architecture.
pub struct HostIdentityProbe {
    os_release_path: PathBuf,
    executor: Arc<dyn CommandExecutor>,
}

impl HostIdentityProbe {
    /// Probe reading `/etc/os-release`.
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_os_release_path(executor, OS_RELEASE_PATH)
    }

    /// Probe reading an os-release file at another location.
    pub fn with_os_release_path(executor: Arc<dyn CommandExecutor>, path: impl Into<PathBuf>) -> Self {
        HostIdentityProbe {
            os_release_path: path.into(),
            executor,
        }
    }
}

#[async_trait]
impl IdentityProbe for HostIdentityProbe {
    async fn detect(&self) -> Result<SystemIdentity, InitializationError> {
        let text = tokio::fs::read_to_string(&self.os_release_path)
            .await
            .map_err(|e| {
                InitializationError::IdentityError(format!(
                    "failed to read {}: {}",
                    self.os_release_path.display(),
                    e
                ))
            })?;
        let (distributor_id, codename) = identity_from_os_release(&text)?;

        let output = self
            .executor
            .execute(DPKG_COMMAND, &["--print-architecture"])
            .await
            .map_err(|e| InitializationError::IdentityError(e.to_string()))?;
        let architecture = output.output.trim().to_string();
        if !output.success() || architecture.is_empty() {
            return Err(InitializationError::IdentityError(format!(
                "{} --print-architecture failed with exit code {}",
                DPKG_COMMAND, output.exit_code
            )));
        }

        debug!(
            "Detected system identity: {} {} ({})",
            distributor_id, codename, architecture
        );
        Ok(SystemIdentity {
            distributor_id,
            codename,
            architecture,
        })
    }
}

/// Parses `KEY=value` lines of an os-release file, unquoting values.
pub fn parse_os_release(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Extracts the distributor id and codename from os-release content.
///
/// The codename is `VERSION_CODENAME`, falling back to `UBUNTU_CODENAME`.
fn identity_from_os_release(text: &str) -> Result<(String, String), InitializationError> {
    let fields = parse_os_release(text);
    let distributor_id = fields
        .get("ID")
        .filter(|id| !id.is_empty())
        .map(|id| id.to_lowercase())
        .ok_or_else(|| InitializationError::IdentityError("os-release has no ID".to_string()))?;
    let codename = ["VERSION_CODENAME", "UBUNTU_CODENAME"]
        .iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_empty())
        .map(|value| value.to_lowercase())
        .ok_or_else(|| {
            InitializationError::IdentityError("os-release has no release codename".to_string())
        })?;
    Ok((distributor_id, codename))
}
