//! `.fyrc.yaml` root configuration.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::{FyError, Result};

/// File name of the root config, expected directly under the IaC root.
pub const FYRC_FILE: &str = ".fyrc.yaml";

/// Settings read from `.fyrc.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    pub org_id: String,
}

impl RootConfig {
    pub fn path_for(iac_root: &Path) -> PathBuf {
        iac_root.join(FYRC_FILE)
    }

    /// Load `.fyrc.yaml` from `iac_root`.
    pub fn load(iac_root: &Path) -> Result<Self> {
        let path = Self::path_for(iac_root);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(FyError::MissingConfig { path });
            }
            Err(err) => return Err(FyError::io(path, err)),
        };
        Self::parse(&content).map_err(|reason| FyError::InvalidConfig { path, reason })
    }

    /// Parse config content. The error is a human-readable reason.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        let Value::Mapping(mapping) = value else {
            return Err("expected a mapping at the top level".to_string());
        };

        match mapping.get("org_id") {
            Some(Value::String(org_id)) if !org_id.trim().is_empty() => Ok(Self {
                org_id: org_id.trim().to_string(),
            }),
            Some(Value::String(_)) => Err("org_id is empty".to_string()),
            Some(_) => Err("org_id must be a string".to_string()),
            None => Err("org_id is not set".to_string()),
        }
    }
}
