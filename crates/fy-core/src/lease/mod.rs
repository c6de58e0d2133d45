//! Short-lived cloud credentials leased from Vault.

pub mod broker;
pub mod manager;
pub mod record;
pub mod store;

pub use broker::{SecretsBroker, VaultCli};
pub use manager::{
    LeaseManager, LeaseState, LeaseTargets, LoadFailure, LoadReport, RevokeFailure, RevokeReport,
    RevokedLease, TrackedLease,
};
pub use record::{LeaseRecord, LeaseTarget, ServiceAccountKey};
pub use store::LeaseStore;
