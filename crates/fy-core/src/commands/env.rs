//! `fy env`: print the resolved environment.

use std::str::FromStr;

use crate::config::VaultSettings;
use crate::context::AppContext;
use crate::environment::EnvironmentView;
use crate::error::{FyError, Result};

/// Output formats, one per `fy env` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFormat {
    /// `pp`: padded key/value listing
    Pretty,
    /// `sh`: shell assignments
    Shell,
    /// `json`: flat JSON object
    Json,
}

impl FromStr for EnvFormat {
    type Err = FyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pp" => Ok(Self::Pretty),
            "sh" => Ok(Self::Shell),
            "json" => Ok(Self::Json),
            other => Err(FyError::UnknownCommand {
                kind: "env",
                name: other.to_string(),
                expected: "pp, sh, json",
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvOptions {
    pub format: EnvFormat,
    /// Mask sensitive values (on unless `--raw`).
    pub obfuscate: bool,
    /// `None` skips the vault section entirely.
    pub vault: Option<VaultSettings>,
}

impl EnvOptions {
    pub fn new(format: EnvFormat) -> Self {
        Self {
            format,
            obfuscate: true,
            vault: None,
        }
    }

    pub fn with_obfuscate(mut self, obfuscate: bool) -> Self {
        self.obfuscate = obfuscate;
        self
    }

    pub fn with_vault(mut self, vault: VaultSettings) -> Self {
        self.vault = Some(vault);
        self
    }
}

pub struct EnvCommand {
    ctx: AppContext,
}

impl EnvCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn view(&self, options: &EnvOptions) -> Result<EnvironmentView> {
        let identity = self.ctx.resolve_identity()?;
        let mut view = EnvironmentView::new(identity, self.ctx.paths());
        if let Some(vault) = &options.vault {
            view = view.with_vault(vault.clone());
        }
        Ok(view)
    }

    /// Render the environment in the requested format.
    pub fn execute(&self, options: &EnvOptions) -> Result<String> {
        let properties = self.view(options)?.properties(options.obfuscate);
        Ok(match options.format {
            EnvFormat::Pretty => properties.to_pretty(),
            EnvFormat::Shell => properties.to_shell(),
            EnvFormat::Json => properties.to_json().to_string(),
        })
    }
}
