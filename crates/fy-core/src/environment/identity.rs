//! Resolved deployment identity.

use std::path::{Path, PathBuf};

use super::classifier::{DeploymentKind, PathSegments};

/// Deployment identity derived from the working directory and `.fyrc.yaml`.
///
/// Built once per invocation by [`super::resolve`]. Derived values
/// (`environment_type`, `project_id`) are computed from the stored inputs on
/// every call so they can never drift from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentIdentity {
    org_id: String,
    region: String,
    environment: String,
    deployment: String,
    kind: DeploymentKind,
    cluster_name: Option<String>,
    app_name: Option<String>,
    iac_root: PathBuf,
    deployment_path: PathBuf,
}

impl DeploymentIdentity {
    pub(crate) fn new(
        org_id: String,
        kind: DeploymentKind,
        segments: PathSegments,
        iac_root: PathBuf,
        deployment_path: PathBuf,
    ) -> Self {
        Self {
            org_id,
            region: segments.region,
            environment: segments.environment,
            deployment: segments.deployment,
            kind,
            cluster_name: segments.cluster_name,
            app_name: segments.app_name,
            iac_root,
            deployment_path,
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Environment with its trailing digits removed (`test0` -> `test`).
    pub fn environment_type(&self) -> &str {
        environment_type(&self.environment)
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn kind(&self) -> DeploymentKind {
        self.kind
    }

    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref()
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn project_id(&self) -> String {
        project_id(&self.org_id, &self.environment, &self.deployment)
    }

    pub fn iac_root(&self) -> &Path {
        &self.iac_root
    }

    pub fn deployment_path(&self) -> &Path {
        &self.deployment_path
    }

    /// kubectl context name written by `gcloud container clusters get-credentials`
    /// for a regional cluster.
    pub fn cluster_context(&self) -> Option<String> {
        self.cluster_name
            .as_ref()
            .map(|cluster| format!("gke_{}_{}_{}", self.project_id(), self.region, cluster))
    }
}

/// `<org_id>-<environment>-<deployment>`.
pub fn project_id(org_id: &str, environment: &str, deployment: &str) -> String {
    format!("{org_id}-{environment}-{deployment}")
}

pub fn environment_type(environment: &str) -> &str {
    environment.trim_end_matches(|c: char| c.is_ascii_digit())
}
