//! fy - deployment environment & credential lease orchestrator
//!
//! Usage:
//!   fy env pp|sh|json [--raw] [--skip-vault]   # Show the resolved environment
//!   fy vault read|revoke|list                  # Manage vault credential leases
//!   fy exec -- <command> [args...]             # Run a tool with leased credentials

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fy_core::FyError;
use fy_core::commands::{
    EnvCommand, EnvFormat, EnvOptions, ExecCommand, ExecOptions, LeaseSummary, VaultCommand,
    VaultOperation, VaultReport,
};
use fy_core::config::VaultSettings;
use fy_core::context::AppContext;
use fy_core::lease::{LoadReport, RevokeReport, VaultCli};

#[derive(Parser)]
#[command(name = "fy")]
#[command(version, about = "Deployment environment & credential lease orchestrator", long_about = None)]
struct Cli {
    /// Verbose tracing output
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Establish environment from deployment context
    Env {
        /// Output format: pp (pretty print), sh (shell sourceable) or json
        format: EnvFormat,

        /// Do not obfuscate secrets
        #[arg(short, long)]
        raw: bool,

        /// Leave vault settings out of the environment
        #[arg(long)]
        skip_vault: bool,
    },

    /// Manage access to the deployment target via vault
    ///
    /// - read: read new cloud credentials
    /// - revoke: revoke local cloud credentials
    /// - list: list local credentials
    Vault {
        /// Operation: read, revoke or list
        operation: VaultOperation,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Run a command with leased credentials, revoking them afterwards
    Exec {
        /// Use ambient credentials instead of reading vault leases
        #[arg(long)]
        skip_vault: bool,

        /// Command to run (after --)
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable listing
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    match run_cli(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report_error(&err)),
    }
}

fn init_tracing(trace: bool) {
    let default_filter = if trace {
        "fy=trace,fy_core=trace,info"
    } else {
        "fy=info,fy_core=info,warn"
    };
    // Logs go to stderr so `fy env sh` output stays sourceable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_cli(command: Commands) -> Result<()> {
    match command {
        Commands::Env {
            format,
            raw,
            skip_vault,
        } => run_env(format, raw, skip_vault),
        Commands::Vault { operation, format } => run_vault(operation, format),
        Commands::Exec {
            skip_vault,
            command,
        } => run_exec(skip_vault, command),
    }
}

fn run_env(format: EnvFormat, raw: bool, skip_vault: bool) -> Result<()> {
    let ctx = AppContext::with_defaults()?;

    let mut options = EnvOptions::new(format).with_obfuscate(!raw);
    if !skip_vault {
        options = options.with_vault(VaultSettings::from_env()?);
    }

    let output = EnvCommand::new(ctx).execute(&options)?;
    if format == EnvFormat::Pretty {
        header("environment");
    }
    println!("{output}");
    Ok(())
}

fn run_vault(operation: VaultOperation, format: OutputFormat) -> Result<()> {
    let ctx = AppContext::with_defaults()?;
    let settings = VaultSettings::from_env()?;
    let broker = VaultCli::new();
    let cmd = VaultCommand::new(ctx, &broker);

    if matches!(format, OutputFormat::Table) {
        header(match operation {
            VaultOperation::Read => "vault leases read",
            VaultOperation::Revoke => "vault leases revoke",
            VaultOperation::List => "vault leases list",
        });
    }

    let report = cmd.execute(operation, &settings)?;
    match &report {
        VaultReport::Read(leases) => print_leases(leases, format)?,
        VaultReport::List { loaded, leases } => {
            print_load_failures(loaded);
            print_leases(leases, format)?;
        }
        VaultReport::Revoke { loaded, revoked } => {
            print_load_failures(loaded);
            print_revoke(revoked, format)?;
        }
    }
    report.into_result()?;
    Ok(())
}

fn run_exec(skip_vault: bool, command: Vec<String>) -> Result<()> {
    let mut parts = command.into_iter();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Missing command to run"))?;

    let ctx = AppContext::with_defaults()?;
    let mut options = ExecOptions::new(program, parts.collect());
    if !skip_vault {
        options = options.with_vault(VaultSettings::from_env()?);
    }

    let broker = VaultCli::new();
    let report = ExecCommand::new(ctx, &broker).execute(&options)?;
    if let Some(cleanup) = &report.cleanup {
        header("vault leases revoke");
        print_revoke(cleanup, OutputFormat::Table)?;
    }
    report.into_result()?;
    Ok(())
}

fn header(title: &str) {
    println!();
    println!("{} {}", style("==>").cyan().bold(), style(title).bold());
    println!();
}

fn print_leases(leases: &[LeaseSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if leases.is_empty() {
                println!("no active leases");
            }
            for lease in leases {
                println!("vault path: {}, lease id: {}", lease.path, lease.lease_id);
                println!("  credentials: {}", lease.credentials_file.display());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(leases)?);
        }
    }
    Ok(())
}

fn print_revoke(report: &RevokeReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if report.nothing_to_do() {
                println!("nothing to be done");
            }
            for revoked in &report.revoked {
                println!("{} revoked {}", style("✓").green(), revoked.lease_id);
                if !revoked.acknowledgement.is_empty() {
                    println!("  {}", revoked.acknowledgement);
                }
                if let Some(error) = &revoked.stale_files {
                    println!("  {} local files left behind: {error}", style("!").yellow());
                }
            }
            for failure in &report.failures {
                println!(
                    "{} {} ({}): {}",
                    style("✗").red(),
                    failure.lease_id,
                    failure.target,
                    failure.error
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "nothing_to_do": report.nothing_to_do(),
                "revoked": report.revoked.iter().map(|r| &r.lease_id).collect::<Vec<_>>(),
                "stale_files": report
                    .revoked
                    .iter()
                    .filter_map(|r| r.stale_files.as_ref().map(|e| serde_json::json!({
                        "lease_id": r.lease_id,
                        "error": e.to_string(),
                    })))
                    .collect::<Vec<_>>(),
                "failed": report
                    .failures
                    .iter()
                    .map(|f| serde_json::json!({
                        "lease_id": f.lease_id,
                        "target": f.target.to_string(),
                        "error": f.error.to_string(),
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_load_failures(loaded: &LoadReport) {
    for failure in &loaded.failures {
        eprintln!(
            "{} could not load lease for {}: {}",
            style("✗").red(),
            failure.target,
            failure.error
        );
    }
}

/// Print the error with any remediation and pick the exit status.
fn report_error(err: &anyhow::Error) -> u8 {
    debug!(error = ?err, "command failed");
    eprintln!("{} {err}", style("Error:").red().bold());

    let Some(fy_err) = err.downcast_ref::<FyError>() else {
        return 1;
    };
    if let FyError::CleanupIncomplete { cleanup, .. } = fy_err {
        for failure in &cleanup.failures {
            eprintln!(
                "  {} lease {} ({}) is still active: {}",
                style("✗").red(),
                failure.lease_id,
                failure.target,
                failure.error
            );
        }
    }
    if let Some(fix) = fy_err.remediation() {
        eprintln!("  {fix}");
    }
    u8::try_from(fy_err.exit_code()).unwrap_or(1)
}
