//! Process environment handed to wrapped tools (terraform, kubectl, gcloud).

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::FyPaths;

pub const TF_IN_AUTOMATION: &str = "TF_IN_AUTOMATION";
pub const KUBECONFIG: &str = "KUBECONFIG";
pub const CLOUDSDK_CONFIG: &str = "CLOUDSDK_CONFIG";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variables for a wrapped tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnvironment {
    vars: BTreeMap<String, String>,
}

impl ToolEnvironment {
    /// Inherited variables plus the fixed overrides every tool run gets.
    pub fn new(inherited: impl IntoIterator<Item = (String, String)>, paths: &FyPaths) -> Self {
        let mut vars: BTreeMap<String, String> = inherited.into_iter().collect();
        vars.insert(TF_IN_AUTOMATION.to_string(), "true".to_string());
        vars.insert(
            KUBECONFIG.to_string(),
            paths.kube_config().display().to_string(),
        );
        Self { vars }
    }

    pub fn from_process(paths: &FyPaths) -> Self {
        Self::new(std::env::vars(), paths)
    }

    /// Point gcloud and Google client libraries at leased credentials.
    pub fn with_credentials(mut self, paths: &FyPaths, credentials_file: &Path) -> Self {
        self.vars.insert(
            CLOUDSDK_CONFIG.to_string(),
            paths.gcloud_config_dir().display().to_string(),
        );
        self.vars.insert(
            GOOGLE_APPLICATION_CREDENTIALS.to_string(),
            credentials_file.display().to_string(),
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
