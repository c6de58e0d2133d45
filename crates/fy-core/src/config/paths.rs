//! Config directory layout.

use std::path::{Path, PathBuf};

use crate::error::{FyError, Result};

/// Environment variable overriding the config root.
pub const CONFIG_DIR_ENV: &str = "FY_CONFIG_DIR";

/// Paths under the fy config root (`~/.config/fy` by default).
///
/// ```text
/// <config>/vault/<project_id>_<role>.json            lease responses
/// <config>/gcp/credentials/<project_id>_<role>.json  decoded keys
/// <config>/gcloud/                                   CLOUDSDK_CONFIG
/// <config>/kube_config.yaml                          KUBECONFIG
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FyPaths {
    config_dir: PathBuf,
}

impl FyPaths {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// `$FY_CONFIG_DIR`, falling back to `~/.config/fy`.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| FyError::MissingVariable("HOME".to_string()))?;
        Ok(Self::for_home(&home))
    }

    pub fn for_home(home_dir: &Path) -> Self {
        Self::new(home_dir.join(".config").join("fy"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn vault_dir(&self) -> PathBuf {
        self.config_dir.join("vault")
    }

    pub fn credentials_dir(&self) -> PathBuf {
        self.config_dir.join("gcp").join("credentials")
    }

    pub fn gcloud_config_dir(&self) -> PathBuf {
        self.config_dir.join("gcloud")
    }

    pub fn kube_config(&self) -> PathBuf {
        self.config_dir.join("kube_config.yaml")
    }
}
