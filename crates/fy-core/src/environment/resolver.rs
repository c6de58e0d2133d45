//! Deployment identity resolution from the working directory.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::classifier::{self, DEPLOYMENT_ANCHOR};
use super::identity::DeploymentIdentity;
use crate::config::RootConfig;
use crate::error::{FyError, Result};

/// Lexically locate the IaC root: everything before the first `deployment`
/// component of `path`.
pub fn locate_iac_root(path: &Path) -> Result<PathBuf> {
    let mut root = PathBuf::new();
    for component in path.components() {
        if let Component::Normal(segment) = component {
            if segment == DEPLOYMENT_ANCHOR {
                return Ok(root);
            }
        }
        root.push(component.as_os_str());
    }
    Err(FyError::RootNotFound {
        path: path.to_path_buf(),
    })
}

/// Resolve the deployment identity for `deployment_path`.
///
/// Fails before touching anything outside `.fyrc.yaml`: a path outside the
/// deployment tree, an unclassified directory or a bad root config all abort
/// resolution.
pub fn resolve(deployment_path: &Path) -> Result<DeploymentIdentity> {
    let iac_root = locate_iac_root(deployment_path)?;

    let (kind, segments) = classifier::classify_required(deployment_path).map_err(|_| {
        FyError::UnclassifiedDeployment {
            path: deployment_path.to_path_buf(),
        }
    })?;

    let config = RootConfig::load(&iac_root)?;
    debug!(
        iac_root = %iac_root.display(),
        kind = %kind,
        org_id = %config.org_id,
        "resolved deployment directory"
    );

    Ok(DeploymentIdentity::new(
        config.org_id,
        kind,
        segments,
        iac_root,
        deployment_path.to_path_buf(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_prefix_before_anchor() {
        let root =
            locate_iac_root(Path::new("/home/u/iac/deployment/us-east1/prod0/core/infra")).unwrap();
        assert_eq!(root, PathBuf::from("/home/u/iac"));
    }

    #[test]
    fn first_anchor_wins() {
        let root =
            locate_iac_root(Path::new("/iac/deployment/us/prod0/deployment/infra")).unwrap();
        assert_eq!(root, PathBuf::from("/iac"));
    }

    #[test]
    fn anchor_must_be_whole_component() {
        let err = locate_iac_root(Path::new("/iac/deployments/us/prod0/core/infra")).unwrap_err();
        assert!(matches!(err, FyError::RootNotFound { .. }));
    }

    #[test]
    fn unclassified_directory_fails_before_config_lookup() {
        // No .fyrc.yaml exists under /nonexistent; the classification error wins.
        let err = resolve(Path::new("/nonexistent/deployment/us/prod0")).unwrap_err();
        assert!(matches!(err, FyError::UnclassifiedDeployment { .. }));
        assert!(err.to_string().contains("not in a valid deployment sub directory"));
    }
}
