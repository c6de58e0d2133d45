//! Secrets broker seam and the `vault(1)` implementation.

use std::process::{Command, Output};

use serde_json::Value;
use tracing::debug;

use crate::error::{FyError, Result};

/// Broker operations the lease manager needs.
pub trait SecretsBroker {
    /// Issue a new lease at `path`; returns the raw response document.
    fn read(&self, path: &str) -> Result<Value>;

    /// Revoke `lease_id`; returns the broker's acknowledgement text.
    fn revoke(&self, lease_id: &str) -> Result<String>;
}

/// Fragments of broker error output that indicate the GCP service account
/// key quota was hit rather than a policy refusal.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "maximum number of keys on account reached",
    "rate_limit_exceeded",
    "ratelimitexceeded",
    "quota exceeded",
];

/// Shells out to the `vault` CLI.
///
/// `VAULT_ADDR` and `VAULT_TOKEN` are inherited from the process environment.
#[derive(Debug, Clone)]
pub struct VaultCli {
    binary: String,
}

impl Default for VaultCli {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultCli {
    pub fn new() -> Self {
        Self::with_binary("vault")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(binary = %self.binary, ?args, "invoking broker");
        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| FyError::BrokerUnavailable {
                binary: self.binary.clone(),
                source,
            })
    }
}

impl SecretsBroker for VaultCli {
    fn read(&self, path: &str) -> Result<Value> {
        let output = self.run(&["read", "-format=json", path])?;
        if !output.status.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_read_failure(path, message));
        }
        serde_json::from_slice(&output.stdout).map_err(|e| FyError::MalformedLease {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn revoke(&self, lease_id: &str) -> Result<String> {
        let output = self.run(&["lease", "revoke", lease_id])?;
        if !output.status.success() {
            return Err(FyError::RevokeFailed {
                lease_id: lease_id.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Tell a key-quota refusal apart from any other refusal.
pub fn classify_read_failure(path: &str, message: String) -> FyError {
    let lowered = message.to_lowercase();
    if RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        FyError::RateLimit {
            path: path.to_string(),
            message,
        }
    } else {
        FyError::LeaseDenied {
            path: path.to_string(),
            message,
        }
    }
}
