//! High-level commands for fy operations.
//!
//! Each command is a closed set of named operations; frontends parse user
//! input into these types and never dispatch on raw strings.

pub mod env;
pub mod exec;
pub mod vault;

pub use env::{EnvCommand, EnvFormat, EnvOptions};
pub use exec::{ExecCommand, ExecOptions, ExecReport};
pub use vault::{LeaseSummary, VaultCommand, VaultOperation, VaultReport};
