//! On-disk persistence for leases and decoded credentials.
//!
//! Both files are named `<project_id>_<role>.json`:
//! - lease directory: the raw broker response
//! - credentials directory: the decoded key document, read by downstream
//!   tools through `GOOGLE_APPLICATION_CREDENTIALS`
//!
//! The store keeps no state of its own; there is no locking across processes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::record::{LeaseRecord, LeaseTarget, ServiceAccountKey};
use crate::config::FyPaths;
use crate::error::{FyError, Result};

#[derive(Debug, Clone)]
pub struct LeaseStore {
    lease_dir: PathBuf,
    credentials_dir: PathBuf,
}

impl LeaseStore {
    pub fn new(lease_dir: PathBuf, credentials_dir: PathBuf) -> Self {
        Self {
            lease_dir,
            credentials_dir,
        }
    }

    pub fn from_paths(paths: &FyPaths) -> Self {
        Self::new(paths.vault_dir(), paths.credentials_dir())
    }

    pub fn lease_dir(&self) -> &Path {
        &self.lease_dir
    }

    pub fn credentials_dir(&self) -> &Path {
        &self.credentials_dir
    }

    pub fn lease_path(&self, target: &LeaseTarget) -> PathBuf {
        self.lease_dir.join(target.file_name())
    }

    pub fn credentials_path(&self, target: &LeaseTarget) -> PathBuf {
        self.credentials_dir.join(target.file_name())
    }

    pub fn write_lease(&self, record: &LeaseRecord) -> Result<PathBuf> {
        let path = self.lease_path(record.target());
        write_json(&path, record.lease_data(), false)?;
        debug!(path = %path.display(), "wrote lease file");
        Ok(path)
    }

    pub fn write_credentials(&self, target: &LeaseTarget, key: &ServiceAccountKey) -> Result<PathBuf> {
        let path = self.credentials_path(target);
        write_json(&path, key, true)?;
        debug!(path = %path.display(), "wrote credentials file");
        Ok(path)
    }

    /// Fails with [`FyError::LeaseNotFound`] when nothing is persisted.
    pub fn read_lease(&self, target: &LeaseTarget) -> Result<LeaseRecord> {
        let path = self.lease_path(target);
        let data = read_json(&path).map_err(|err| match err {
            ReadError::Missing => FyError::LeaseNotFound { path: path.clone() },
            ReadError::Failed(err) => err,
        })?;
        Ok(LeaseRecord::from_response(target.clone(), data))
    }

    /// Fails with [`FyError::CredentialsNotFound`] when nothing is persisted.
    pub fn read_credentials(&self, target: &LeaseTarget) -> Result<ServiceAccountKey> {
        let path = self.credentials_path(target);
        read_json(&path).map_err(|err| match err {
            ReadError::Missing => FyError::CredentialsNotFound { path: path.clone() },
            ReadError::Failed(err) => err,
        })
    }

    /// Returns whether a file was removed; a missing file is not an error.
    pub fn delete_lease(&self, target: &LeaseTarget) -> Result<bool> {
        remove_if_present(&self.lease_path(target))
    }

    /// Returns whether a file was removed; a missing file is not an error.
    pub fn delete_credentials(&self, target: &LeaseTarget) -> Result<bool> {
        remove_if_present(&self.credentials_path(target))
    }
}

enum ReadError {
    Missing,
    Failed(FyError),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> std::result::Result<T, ReadError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(ReadError::Missing),
        Err(err) => return Err(ReadError::Failed(FyError::io(path, err))),
    };
    serde_json::from_slice(&bytes).map_err(|e| ReadError::Failed(FyError::json(path, e)))
}

/// Write atomically (tmp + rename), creating parent directories as needed.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, private: bool) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| FyError::io(path, std::io::Error::other("path has no parent directory")))?;
    fs::create_dir_all(dir).map_err(|e| FyError::io(dir, e))?;

    let bytes = serde_json::to_vec(value).map_err(|e| FyError::json(path, e))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));
    fs::write(&tmp_path, bytes).map_err(|e| FyError::io(&tmp_path, e))?;
    if private {
        restrict_permissions(&tmp_path)?;
    }
    fs::rename(&tmp_path, path).map_err(|e| FyError::io(path, e))?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| FyError::io(path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed file");
            Ok(true)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(FyError::io(path, err)),
    }
}
