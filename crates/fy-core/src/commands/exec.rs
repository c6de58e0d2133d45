//! `fy exec`: run a wrapped tool inside a credential session.
//!
//! The session acquires leases, exports them to the tool through
//! [`ToolEnvironment`], and always revokes them afterwards.

use std::process::Command;

use tracing::info;

use crate::config::VaultSettings;
use crate::context::AppContext;
use crate::environment::ToolEnvironment;
use crate::error::{FyError, Result};
use crate::lease::{LeaseManager, RevokeReport, SecretsBroker};

#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub program: String,
    pub args: Vec<String>,
    /// `None` runs the tool with ambient credentials.
    pub vault: Option<VaultSettings>,
}

impl ExecOptions {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            vault: None,
        }
    }

    pub fn with_vault(mut self, vault: VaultSettings) -> Self {
        self.vault = Some(vault);
        self
    }
}

#[derive(Debug, Default)]
pub struct ExecReport {
    /// Revocation pass run after the tool, when vault was used.
    pub cleanup: Option<RevokeReport>,
}

impl ExecReport {
    /// Fail when the closing revocation left leases behind.
    pub fn into_result(self) -> Result<Self> {
        match self.cleanup {
            Some(cleanup) => Ok(Self {
                cleanup: Some(cleanup.into_result()?),
            }),
            None => Ok(self),
        }
    }
}

pub struct ExecCommand<'a> {
    ctx: AppContext,
    broker: &'a dyn SecretsBroker,
}

impl<'a> ExecCommand<'a> {
    pub fn new(ctx: AppContext, broker: &'a dyn SecretsBroker) -> Self {
        Self { ctx, broker }
    }

    pub fn execute(&self, options: &ExecOptions) -> Result<ExecReport> {
        let identity = self.ctx.resolve_identity()?;
        let env = ToolEnvironment::from_process(self.ctx.paths());

        let Some(vault) = &options.vault else {
            self.run_tool(options, &env)?;
            return Ok(ExecReport::default());
        };

        let targets = self.ctx.lease_targets(&identity, &vault.role)?;
        let mut manager = LeaseManager::new(self.broker, self.ctx.lease_store(), targets);
        manager.guarded(|m| m.read())?;

        let env = env.with_credentials(self.ctx.paths(), &manager.default_credentials_path());
        let outcome = self.run_tool(options, &env);

        let cleanup = manager.cleanup();
        if let Err(err) = outcome {
            return Err(err.with_cleanup(cleanup));
        }
        Ok(ExecReport {
            cleanup: Some(cleanup),
        })
    }

    fn run_tool(&self, options: &ExecOptions, env: &ToolEnvironment) -> Result<()> {
        info!(program = %options.program, args = ?options.args, "running wrapped tool");
        let status = Command::new(&options.program)
            .args(&options.args)
            .current_dir(self.ctx.working_dir())
            .env_clear()
            .envs(env.iter())
            .status()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => FyError::ToolUnavailable {
                    program: options.program.clone(),
                    source,
                },
                _ => FyError::io(self.ctx.working_dir(), source),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(FyError::ToolFailed {
                program: options.program.clone(),
                code: status.code().unwrap_or(1),
            })
        }
    }
}
