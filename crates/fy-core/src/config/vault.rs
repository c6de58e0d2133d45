//! Vault connection settings taken from the process environment.

use crate::error::{FyError, Result};

pub const VAULT_ROLE_ENV: &str = "VAULT_ROLE";
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct VaultSettings {
    pub role: String,
    pub addr: String,
    pub token: String,
}

impl std::fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSettings")
            .field("role", &self.role)
            .field("addr", &self.addr)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl VaultSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| FyError::MissingVariable(key.to_string()))
        };
        Ok(Self {
            role: get(VAULT_ROLE_ENV)?,
            addr: get(VAULT_ADDR_ENV)?,
            token: get(VAULT_TOKEN_ENV)?,
        })
    }
}
