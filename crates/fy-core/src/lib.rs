//! fy Core Library
//!
//! Derives deployment identity from the directory layout of an
//! infrastructure-as-code workspace and manages the short-lived cloud
//! credentials leased from Vault for it.

pub mod commands;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod lease;

pub use error::{FyError, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{FyPaths, ProviderEntry, RootConfig, VaultSettings};
    pub use crate::context::AppContext;

    // Environment
    pub use crate::environment::{
        DeploymentIdentity, DeploymentKind, EnvironmentView, Properties, ToolEnvironment,
    };

    // Leases
    pub use crate::lease::{
        LeaseManager, LeaseRecord, LeaseStore, LeaseTarget, LeaseTargets, SecretsBroker, VaultCli,
    };

    // Errors
    pub use crate::error::{FyError, Result};
}
