//! `fy vault`: read, revoke and list credential leases.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::config::VaultSettings;
use crate::context::AppContext;
use crate::error::{FyError, Result};
use crate::lease::{LeaseManager, LeaseRecord, LoadReport, RevokeReport, SecretsBroker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultOperation {
    /// Acquire new credentials for every target.
    Read,
    /// Load persisted leases and revoke them.
    Revoke,
    /// Load persisted leases and list the active ones.
    List,
}

impl FromStr for VaultOperation {
    type Err = FyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read" => Ok(Self::Read),
            "revoke" => Ok(Self::Revoke),
            "list" => Ok(Self::List),
            other => Err(FyError::UnknownCommand {
                kind: "vault",
                name: other.to_string(),
                expected: "read, revoke, list",
            }),
        }
    }
}

/// One active lease, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseSummary {
    pub path: String,
    pub lease_id: String,
    pub lease_file: PathBuf,
    pub credentials_file: PathBuf,
}

#[derive(Debug)]
pub enum VaultReport {
    Read(Vec<LeaseSummary>),
    /// Targets whose lease file was unreadable are in `loaded`; the rest
    /// were still revoked.
    Revoke {
        loaded: LoadReport,
        revoked: RevokeReport,
    },
    List {
        loaded: LoadReport,
        leases: Vec<LeaseSummary>,
    },
}

impl VaultReport {
    /// Fold per-lease failures into an overall error.
    pub fn into_result(self) -> Result<Self> {
        match self {
            Self::Revoke { loaded, revoked } => {
                let revoked = revoked.into_result()?;
                Ok(Self::Revoke {
                    loaded: loaded.into_result()?,
                    revoked,
                })
            }
            Self::List { loaded, leases } => Ok(Self::List {
                loaded: loaded.into_result()?,
                leases,
            }),
            read => Ok(read),
        }
    }
}

pub struct VaultCommand<'a> {
    ctx: AppContext,
    broker: &'a dyn SecretsBroker,
}

impl<'a> VaultCommand<'a> {
    pub fn new(ctx: AppContext, broker: &'a dyn SecretsBroker) -> Self {
        Self { ctx, broker }
    }

    /// Run `operation` for the deployment in the context's working directory.
    ///
    /// Identity and provider files are resolved before the broker or the
    /// lease store is touched.
    pub fn execute(&self, operation: VaultOperation, vault: &VaultSettings) -> Result<VaultReport> {
        let identity = self.ctx.resolve_identity()?;
        let targets = self.ctx.lease_targets(&identity, &vault.role)?;
        let mut manager = LeaseManager::new(self.broker, self.ctx.lease_store(), targets);

        match operation {
            VaultOperation::Read => {
                manager.guarded(|m| m.read())?;
                Ok(VaultReport::Read(summaries(&manager)))
            }
            VaultOperation::Revoke => {
                let loaded = manager.load();
                Ok(VaultReport::Revoke {
                    loaded,
                    revoked: manager.revoke(),
                })
            }
            VaultOperation::List => {
                let loaded = manager.load();
                Ok(VaultReport::List {
                    loaded,
                    leases: summaries(&manager),
                })
            }
        }
    }
}

fn summaries(manager: &LeaseManager<'_>) -> Vec<LeaseSummary> {
    manager
        .list()
        .into_iter()
        .map(|record| summarize(manager, record))
        .collect()
}

fn summarize(manager: &LeaseManager<'_>, record: &LeaseRecord) -> LeaseSummary {
    let store = manager.store();
    LeaseSummary {
        path: record.path(),
        lease_id: record.lease_id().unwrap_or_default().to_string(),
        lease_file: store.lease_path(record.target()),
        credentials_file: store.credentials_path(record.target()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_parse_from_names() {
        assert_eq!("read".parse::<VaultOperation>().unwrap(), VaultOperation::Read);
        assert_eq!("revoke".parse::<VaultOperation>().unwrap(), VaultOperation::Revoke);
        assert_eq!("list".parse::<VaultOperation>().unwrap(), VaultOperation::List);
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = "roll-key".parse::<VaultOperation>().unwrap_err();
        assert!(matches!(err, FyError::UnknownCommand { kind: "vault", .. }));
    }
}
