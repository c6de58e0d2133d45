//! Lease lifecycle across the default and additional project/role pairs.
//!
//! Per lease:
//!
//! ```text
//! Uninitialized --read--> Active --revoke--> Revoked
//! Uninitialized --load (file present)--> Active
//! Uninitialized --load (file absent)---> None
//! ```
//!
//! Targets are always processed default first, then additional targets in the
//! order they were declared. Frontends index leases positionally, so this
//! order is part of the contract.

use std::path::PathBuf;

use tracing::{error, info, warn};

use super::broker::SecretsBroker;
use super::record::{LeaseRecord, LeaseTarget, ServiceAccountKey};
use super::store::LeaseStore;
use crate::config::ProviderEntry;
use crate::error::{FyError, Result};

/// The ordered set of project/role pairs a manager works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseTargets {
    targets: Vec<LeaseTarget>,
}

impl LeaseTargets {
    /// Duplicate pairs keep their first position.
    pub fn new(default: LeaseTarget, additional: impl IntoIterator<Item = LeaseTarget>) -> Self {
        let mut targets = vec![default];
        for target in additional {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        Self { targets }
    }

    pub fn from_providers(default: LeaseTarget, entries: &[ProviderEntry]) -> Self {
        Self::new(
            default,
            entries
                .iter()
                .map(|entry| LeaseTarget::new(&entry.project_id, &entry.vault_role)),
        )
    }

    pub fn default_target(&self) -> &LeaseTarget {
        &self.targets[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeaseTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeaseState {
    Active(LeaseRecord),
    /// Nothing persisted for this target; terminal for this invocation.
    None,
    Revoked(LeaseRecord),
}

/// A lease the manager has read or loaded.
#[derive(Debug, Clone)]
pub struct TrackedLease {
    target: LeaseTarget,
    state: LeaseState,
    credentials: Option<ServiceAccountKey>,
}

impl TrackedLease {
    pub fn target(&self) -> &LeaseTarget {
        &self.target
    }

    pub fn state(&self) -> &LeaseState {
        &self.state
    }

    pub fn credentials(&self) -> Option<&ServiceAccountKey> {
        self.credentials.as_ref()
    }

    pub fn active_record(&self) -> Option<&LeaseRecord> {
        match &self.state {
            LeaseState::Active(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct RevokedLease {
    pub target: LeaseTarget,
    pub lease_id: String,
    pub acknowledgement: String,
    /// Set when the broker revoked the lease but its local files could not
    /// be removed.
    pub stale_files: Option<FyError>,
}

#[derive(Debug)]
pub struct RevokeFailure {
    pub target: LeaseTarget,
    pub lease_id: String,
    pub error: FyError,
}

/// A target whose persisted lease could not be read.
#[derive(Debug)]
pub struct LoadFailure {
    pub target: LeaseTarget,
    pub error: FyError,
}

/// Outcome of a load pass. Missing files are not failures.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(FyError::LoadIncomplete {
                failures: self.failures.len(),
            })
        }
    }
}

/// Outcome of a revoke pass.
#[derive(Debug, Default)]
pub struct RevokeReport {
    pub revoked: Vec<RevokedLease>,
    pub failures: Vec<RevokeFailure>,
}

impl RevokeReport {
    /// No active lease was held, so nothing was attempted.
    pub fn nothing_to_do(&self) -> bool {
        self.revoked.is_empty() && self.failures.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn per-lease failures into an overall error.
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(FyError::RevokeIncomplete {
                failures: self.failures.len(),
            })
        }
    }
}

pub struct LeaseManager<'a> {
    broker: &'a dyn SecretsBroker,
    store: LeaseStore,
    targets: LeaseTargets,
    leases: Vec<TrackedLease>,
}

impl<'a> LeaseManager<'a> {
    pub fn new(broker: &'a dyn SecretsBroker, store: LeaseStore, targets: LeaseTargets) -> Self {
        Self {
            broker,
            store,
            targets,
            leases: Vec::new(),
        }
    }

    pub fn targets(&self) -> &LeaseTargets {
        &self.targets
    }

    pub fn store(&self) -> &LeaseStore {
        &self.store
    }

    pub fn leases(&self) -> &[TrackedLease] {
        &self.leases
    }

    /// Credentials file of the default target, exported to wrapped tools.
    pub fn default_credentials_path(&self) -> PathBuf {
        self.store
            .credentials_path(self.targets.default_target())
    }

    /// Acquire a fresh lease for every target.
    ///
    /// Stops at the first failure. Leases acquired before it stay tracked so
    /// a cleanup pass can revoke them.
    pub fn read(&mut self) -> Result<()> {
        let targets: Vec<LeaseTarget> = self.targets.iter().cloned().collect();
        for target in targets {
            self.acquire(target)?;
        }
        Ok(())
    }

    fn acquire(&mut self, target: LeaseTarget) -> Result<()> {
        let path = target.path();
        info!(%path, "vault read");
        let response = self.broker.read(&path)?;

        let record = LeaseRecord::from_response(target.clone(), response);
        let Some(lease_id) = record.lease_id().map(str::to_string) else {
            return Err(FyError::MalformedLease {
                path,
                reason: "response has no lease_id".to_string(),
            });
        };
        info!(%lease_id, "vault lease acquired");

        // Tracked before anything else can fail so cleanup always revokes it.
        self.leases.push(TrackedLease {
            target: target.clone(),
            state: LeaseState::Active(record.clone()),
            credentials: None,
        });

        self.store.write_lease(&record)?;
        let key = record.decode_credentials()?;
        self.store.write_credentials(&target, &key)?;
        if let Some(lease) = self.leases.last_mut() {
            lease.credentials = Some(key);
        }
        Ok(())
    }

    /// Reload persisted leases for every target without contacting the broker.
    ///
    /// A missing lease file leaves that target without an active lease. An
    /// unreadable one is recorded in the report and the remaining targets are
    /// still loaded. The lease is not re-validated; a stale lease surfaces on
    /// the next broker call.
    pub fn load(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        let targets: Vec<LeaseTarget> = self.targets.iter().cloned().collect();
        for target in targets {
            let state = match self.store.read_lease(&target) {
                Ok(record) if record.is_active() => LeaseState::Active(record),
                Ok(_) => LeaseState::None,
                Err(err) if err.is_not_found() => {
                    warn!(project_id = %target.project_id, "failed to load vault lease: {err}");
                    LeaseState::None
                }
                Err(error) => {
                    error!(project_id = %target.project_id, "unreadable vault lease: {error}");
                    report.failures.push(LoadFailure {
                        target: target.clone(),
                        error,
                    });
                    LeaseState::None
                }
            };

            let credentials = match self.store.read_credentials(&target) {
                Ok(key) => Some(key),
                Err(err) => {
                    warn!(project_id = %target.project_id, "failed to load credentials: {err}");
                    None
                }
            };

            self.leases.push(TrackedLease {
                target,
                state,
                credentials,
            });
        }
        report
    }

    pub fn has_active(&self) -> bool {
        self.leases.iter().any(|lease| lease.active_record().is_some())
    }

    /// Active leases in collection order.
    pub fn list(&self) -> Vec<&LeaseRecord> {
        self.leases
            .iter()
            .filter_map(TrackedLease::active_record)
            .collect()
    }

    /// Revoke every active lease.
    ///
    /// Each lease is handled independently: a broker failure on one lease is
    /// recorded and the remaining leases are still attempted. Files are only
    /// removed once the broker accepted the revocation.
    pub fn revoke(&mut self) -> RevokeReport {
        let mut report = RevokeReport::default();
        let broker = self.broker;
        let store = &self.store;

        for lease in &mut self.leases {
            let LeaseState::Active(record) = &lease.state else {
                continue;
            };
            let Some(lease_id) = record.lease_id().map(str::to_string) else {
                continue;
            };
            info!(%lease_id, "vault lease revoke");

            let acknowledgement = match broker.revoke(&lease_id) {
                Ok(ack) => ack,
                Err(error) => {
                    report.failures.push(RevokeFailure {
                        target: lease.target.clone(),
                        lease_id,
                        error,
                    });
                    continue;
                }
            };

            let state = std::mem::replace(&mut lease.state, LeaseState::None);
            if let LeaseState::Active(record) = state {
                lease.state = LeaseState::Revoked(record);
            }
            lease.credentials = None;

            let lease_removed = store.delete_lease(&lease.target);
            let credentials_removed = store.delete_credentials(&lease.target);
            let stale_files = lease_removed.and(credentials_removed).err();
            if let Some(error) = &stale_files {
                warn!(%lease_id, "lease revoked but local files remain: {error}");
            }

            report.revoked.push(RevokedLease {
                target: lease.target.clone(),
                lease_id,
                acknowledgement,
                stale_files,
            });
        }

        report
    }

    /// Best-effort revoke of everything still active, logging each failure.
    pub fn cleanup(&mut self) -> RevokeReport {
        let report = self.revoke();
        for failure in &report.failures {
            error!(
                target_lease = %failure.target,
                lease_id = %failure.lease_id,
                "cleanup failed to revoke lease: {}",
                failure.error
            );
        }
        report
    }

    /// Run `op`; if it fails while leases are held, revoke them before
    /// returning the error. Leases the cleanup could not revoke are attached
    /// to the error.
    pub fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) if self.has_active() => {
                warn!("operation failed, revoking held leases: {err}");
                let cleanup = self.cleanup();
                Err(err.with_cleanup(cleanup))
            }
            Err(err) => Err(err),
        }
    }
}
