//! Structural classification of deployment directories.
//!
//! A working directory is one of three layers of the deployment tree:
//!
//! | Shape                                                         | Kind      |
//! |---------------------------------------------------------------|-----------|
//! | `deployment/<region>/<env>/<deployment>/infra`                | `infra`   |
//! | `deployment/<region>/<env>/<deployment>/app/cluster/<c>`      | `cluster` |
//! | `deployment/<region>/<env>/<deployment>/app/cluster/<c>/<a>`  | `app`     |
//!
//! Matching looks only at path segments counted from the end; the
//! filesystem is never consulted.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{FyError, Result};

/// Literal segment every deployment shape is anchored on.
pub const DEPLOYMENT_ANCHOR: &str = "deployment";

/// Which layer of the deployment hierarchy a directory represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentKind {
    Infra,
    Cluster,
    App,
    Unresolved,
}

impl DeploymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Infra => "infra",
            Self::Cluster => "cluster",
            Self::App => "app",
            Self::Unresolved => "unresolved",
        }
    }

    pub fn is_resolved(self) -> bool {
        self != Self::Unresolved
    }

    /// Offset of the region segment counted from the end of the path.
    fn region_offset(self) -> Option<usize> {
        match self {
            Self::Infra => Some(4),
            Self::Cluster => Some(6),
            Self::App => Some(7),
            Self::Unresolved => None,
        }
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity segments extracted from a classified path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments {
    pub region: String,
    pub environment: String,
    pub deployment: String,
    pub cluster_name: Option<String>,
    pub app_name: Option<String>,
}

/// Result of classifying a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: DeploymentKind,
    /// `None` exactly when `kind` is `Unresolved`.
    pub segments: Option<PathSegments>,
}

impl Classification {
    fn unresolved() -> Self {
        Self {
            kind: DeploymentKind::Unresolved,
            segments: None,
        }
    }
}

/// Classify `path` against the fixed deployment shapes.
pub fn classify(path: &Path) -> Classification {
    let Some(parts) = normal_segments(path) else {
        return Classification::unresolved();
    };

    // Order matters only for pathological paths that satisfy two shapes.
    let kind = if matches_shape(&parts, &[Some("app"), Some("cluster"), None]) {
        DeploymentKind::Cluster
    } else if matches_shape(&parts, &[Some("app"), Some("cluster"), None, None]) {
        DeploymentKind::App
    } else if matches_shape(&parts, &[Some("infra")]) {
        DeploymentKind::Infra
    } else {
        return Classification::unresolved();
    };

    let Some(offset) = kind.region_offset() else {
        return Classification::unresolved();
    };
    let from_end = |n: usize| parts[parts.len() - n].to_string();

    let (cluster_name, app_name) = match kind {
        DeploymentKind::Cluster => (Some(from_end(1)), None),
        DeploymentKind::App => (Some(from_end(2)), Some(from_end(1))),
        _ => (None, None),
    };

    Classification {
        kind,
        segments: Some(PathSegments {
            region: from_end(offset),
            environment: from_end(offset - 1),
            deployment: from_end(offset - 2),
            cluster_name,
            app_name,
        }),
    }
}

/// Classify `path`, failing when it matches none of the shapes.
pub fn classify_required(path: &Path) -> Result<(DeploymentKind, PathSegments)> {
    let classification = classify(path);
    match classification.segments {
        Some(segments) => Ok((classification.kind, segments)),
        None => Err(FyError::Classification {
            path: path.to_path_buf(),
        }),
    }
}

/// Checks the tail of `parts` against `anchor / region / env / deployment / tail...`.
///
/// `tail` entries of `None` match any segment; `Some(lit)` must match exactly.
fn matches_shape(parts: &[&str], tail: &[Option<&str>]) -> bool {
    // anchor + region + environment + deployment
    let needed = 4 + tail.len();
    if parts.len() < needed {
        return false;
    }
    let window = &parts[parts.len() - needed..];
    if window[0] != DEPLOYMENT_ANCHOR {
        return false;
    }
    window[4..]
        .iter()
        .zip(tail)
        .all(|(part, expected)| expected.is_none_or(|literal| *part == literal))
}

/// `None` when a component is not UTF-8; skipping it would shift the offsets.
fn normal_segments(path: &Path) -> Option<Vec<&str>> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infra_shape_extracts_identity() {
        let (kind, segments) =
            classify_required(Path::new("/iac/deployment/europe-west1/test0/core/infra")).unwrap();

        assert_eq!(kind, DeploymentKind::Infra);
        assert_eq!(segments.region, "europe-west1");
        assert_eq!(segments.environment, "test0");
        assert_eq!(segments.deployment, "core");
        assert_eq!(segments.cluster_name, None);
        assert_eq!(segments.app_name, None);
    }

    #[test]
    fn trailing_separator_is_ignored() {
        let classification = classify(Path::new("/iac/deployment/r/e/d/infra/"));
        assert_eq!(classification.kind, DeploymentKind::Infra);
    }

    #[test]
    fn deployment_root_itself_is_unresolved() {
        let classification = classify(Path::new("/iac/deployment/r/e/d"));
        assert_eq!(classification.kind, DeploymentKind::Unresolved);
        assert!(classification.segments.is_none());
    }

    #[test]
    fn app_directory_without_cluster_segment_is_unresolved() {
        let classification = classify(Path::new("/iac/deployment/r/e/d/app/other/main"));
        assert_eq!(classification.kind, DeploymentKind::Unresolved);
    }

    #[test]
    fn missing_anchor_is_unresolved() {
        let classification = classify(Path::new("/iac/deploy/r/e/d/infra"));
        assert_eq!(classification.kind, DeploymentKind::Unresolved);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_component_is_unresolved() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/a/deployment/r/e/d")
            .join(OsStr::from_bytes(b"\xff\xfe"))
            .join("infra");
        let classification = classify(&path);
        assert_eq!(classification.kind, DeploymentKind::Unresolved);
        assert!(classification.segments.is_none());
    }

    #[test]
    fn kind_renders_snake_case() {
        assert_eq!(DeploymentKind::Cluster.to_string(), "cluster");
        assert_eq!(
            serde_json::to_string(&DeploymentKind::App).unwrap(),
            "\"app\""
        );
    }
}
