//! Provider declaration files (`*.providers.yml`).
//!
//! Each file lists extra GCP projects that need credentials next to the
//! deployment's own project:
//!
//! ```yaml
//! providers:
//!   gcp:
//!     - project_id: beta-prod0-svc
//!       vault_role: deploy
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FyError, Result};

/// File name suffix identifying provider declaration files.
pub const PROVIDERS_SUFFIX: &str = ".providers.yml";

/// One additional project/role pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderEntry {
    pub project_id: String,
    pub vault_role: String,
}

#[derive(Debug, Deserialize)]
struct ProvidersFile {
    providers: ProviderSections,
}

#[derive(Debug, Deserialize)]
struct ProviderSections {
    #[serde(default)]
    gcp: Vec<ProviderEntry>,
}

/// Provider declaration files directly inside `dir`, sorted by file name.
pub fn discover_provider_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(FyError::io(dir, err)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FyError::io(dir, e))?;
        let path = entry.path();
        let is_declaration = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(PROVIDERS_SUFFIX) && name != PROVIDERS_SUFFIX);
        if is_declaration && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse one provider declaration document.
pub fn parse_providers(path: &Path, content: &str) -> Result<Vec<ProviderEntry>> {
    let file: ProvidersFile =
        serde_yaml::from_str(content).map_err(|e| FyError::InvalidProviders {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(file.providers.gcp)
}

/// Entries from `files`, in file order then declaration order.
pub fn load_provider_entries(files: &[PathBuf]) -> Result<Vec<ProviderEntry>> {
    let mut entries = Vec::new();
    for path in files {
        let content = std::fs::read_to_string(path).map_err(|e| FyError::io(path, e))?;
        entries.extend(parse_providers(path, &content)?);
    }
    Ok(entries)
}
