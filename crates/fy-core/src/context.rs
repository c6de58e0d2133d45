//! Application context shared by the commands.

use std::path::{Path, PathBuf};

use crate::config::{FyPaths, discover_provider_files, load_provider_entries};
use crate::environment::{self, DeploymentIdentity};
use crate::error::{FyError, Result};
use crate::lease::{LeaseStore, LeaseTarget, LeaseTargets};

/// Working directory plus config layout for one invocation.
///
/// Frontends create this once and hand it to commands; the commands derive
/// every capability (resolver input, lease store, provider discovery) from it.
#[derive(Debug, Clone)]
pub struct AppContext {
    working_dir: PathBuf,
    paths: FyPaths,
}

impl AppContext {
    pub fn new(working_dir: PathBuf, paths: FyPaths) -> Self {
        Self { working_dir, paths }
    }

    /// Context from the process: `$PWD` (so symlinked deployment directories
    /// keep their logical path), else the current directory.
    pub fn with_defaults() -> Result<Self> {
        let working_dir = match std::env::var_os("PWD").map(PathBuf::from) {
            Some(pwd) if pwd.is_absolute() => pwd,
            _ => std::env::current_dir().map_err(|e| FyError::io(".", e))?,
        };
        Ok(Self::new(working_dir, FyPaths::from_env()?))
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn paths(&self) -> &FyPaths {
        &self.paths
    }

    pub fn resolve_identity(&self) -> Result<DeploymentIdentity> {
        environment::resolve(&self.working_dir)
    }

    pub fn lease_store(&self) -> LeaseStore {
        LeaseStore::from_paths(&self.paths)
    }

    /// Provider declaration files in the working directory, sorted.
    pub fn provider_files(&self) -> Result<Vec<PathBuf>> {
        discover_provider_files(&self.working_dir)
    }

    /// Default target for `identity` plus every declared provider.
    pub fn lease_targets(&self, identity: &DeploymentIdentity, role: &str) -> Result<LeaseTargets> {
        let entries = load_provider_entries(&self.provider_files()?)?;
        Ok(LeaseTargets::from_providers(
            LeaseTarget::new(identity.project_id(), role),
            &entries,
        ))
    }
}
