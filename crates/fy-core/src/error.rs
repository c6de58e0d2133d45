//! Error taxonomy for environment resolution and credential leases.

use std::path::PathBuf;

use thiserror::Error;

use crate::lease::RevokeReport;

/// Exit status used when a required external binary cannot be executed.
pub const EXIT_TOOL_NOT_FOUND: i32 = 127;

/// Exit status used when the broker was reached but the operation failed.
pub const EXIT_BROKER_FAILED: i32 = 2;

#[derive(Debug, Error)]
pub enum FyError {
    #[error("path does not match any deployment layout: {}", .path.display())]
    Classification { path: PathBuf },

    #[error("unknown {kind} command: {name} (expected one of: {expected})")]
    UnknownCommand {
        kind: &'static str,
        name: String,
        expected: &'static str,
    },

    #[error(
        "cannot detect iac root directory, does a 'deployment' directory exist in {}?",
        .path.display()
    )]
    RootNotFound { path: PathBuf },

    #[error("not in a valid deployment sub directory: {}", .path.display())]
    UnclassifiedDeployment { path: PathBuf },

    #[error("config file not found: {}", .path.display())]
    MissingConfig { path: PathBuf },

    #[error("invalid config file {}: {reason}", .path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("invalid providers file {}: {reason}", .path.display())]
    InvalidProviders { path: PathBuf, reason: String },

    #[error("variable not set: {0}")]
    MissingVariable(String),

    #[error("could not find {binary}(1) in path, please install {binary}")]
    BrokerUnavailable {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("broker refused to issue lease for {path}: {message}")]
    LeaseDenied { path: String, message: String },

    #[error("service account key issuance rate limited for {path}: {message}")]
    RateLimit { path: String, message: String },

    #[error("malformed broker response for {path}: {reason}")]
    MalformedLease { path: String, reason: String },

    #[error("failed to revoke lease {lease_id}: {message}")]
    RevokeFailed { lease_id: String, message: String },

    #[error("{failures} lease(s) could not be revoked")]
    RevokeIncomplete { failures: usize },

    #[error("{failures} lease file(s) could not be read")]
    LoadIncomplete { failures: usize },

    #[error("{error} (cleanup left {} lease(s) unrevoked)", .cleanup.failures.len())]
    CleanupIncomplete {
        #[source]
        error: Box<FyError>,
        cleanup: RevokeReport,
    },

    #[error("no lease file found: {}", .path.display())]
    LeaseNotFound { path: PathBuf },

    #[error("no credentials file found: {}", .path.display())]
    CredentialsNotFound { path: PathBuf },

    #[error("could not find {program}(1) in path, please install {program}")]
    ToolUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}")]
    ToolFailed { program: String, code: i32 },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, FyError>;

impl FyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Attach a cleanup pass that left leases behind; a clean pass changes
    /// nothing.
    pub fn with_cleanup(self, cleanup: RevokeReport) -> Self {
        if cleanup.is_success() {
            self
        } else {
            Self::CleanupIncomplete {
                error: Box::new(self),
                cleanup,
            }
        }
    }

    /// The error that started it all, looking through cleanup failures.
    pub fn primary(&self) -> &FyError {
        match self {
            Self::CleanupIncomplete { error, .. } => error.primary(),
            other => other,
        }
    }

    /// Process exit status a frontend should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CleanupIncomplete { error, .. } => error.exit_code(),
            Self::BrokerUnavailable { .. } | Self::ToolUnavailable { .. } => EXIT_TOOL_NOT_FOUND,
            Self::LeaseDenied { .. }
            | Self::RateLimit { .. }
            | Self::MalformedLease { .. }
            | Self::RevokeFailed { .. }
            | Self::RevokeIncomplete { .. } => EXIT_BROKER_FAILED,
            Self::ToolFailed { code, .. } => *code,
            _ => 1,
        }
    }

    /// Operator guidance printed alongside the error, if any.
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::MissingConfig { path } => Some(format!(
                "create config file at root: {} (containing at least `org_id: <org>`)",
                path.display()
            )),
            Self::InvalidConfig { .. } => Some("is org_id set in .fyrc.yaml?".to_string()),
            Self::MissingVariable(name) => Some(format!(
                "export {name} or pass --skip-vault to run without vault credentials"
            )),
            Self::RateLimit { .. } => Some(
                "the service account has reached its key quota; revoke stale leases \
                 (fy vault revoke) or wait for the quota window, then retry"
                    .to_string(),
            ),
            Self::CleanupIncomplete { error, .. } => Some(error.remediation().unwrap_or_else(|| {
                "run `fy vault revoke` to retry the remaining leases".to_string()
            })),
            Self::LoadIncomplete { .. } => Some(
                "inspect or remove the unreadable lease files under the vault directory".to_string(),
            ),
            Self::UnclassifiedDeployment { .. } | Self::RootNotFound { .. } => Some(
                "change to an infra, cluster or app directory under deployment/".to_string(),
            ),
            _ => None,
        }
    }

    /// True for the recoverable "nothing persisted yet" conditions.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::LeaseNotFound { .. } | Self::CredentialsNotFound { .. }
        )
    }
}
