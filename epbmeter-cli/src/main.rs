// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! EPBMeter CLI - EPB electricity usage from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Store credentials (verified against the API first)
//! echo "$PASSWORD" | epbmeter login --username me@example.com --password-stdin
//!
//! # Current billing period usage for every linked account
//! epbmeter
//!
//! # One account, a past period, as JSON
//! epbmeter usage --account 123456 --year 2024 --month 12 --format json --pretty
//!
//! # Poll every 15 minutes
//! epbmeter watch --interval 900
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use epbmeter_fetch::EpbError;
use epbmeter_store::{Config, StoreError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{accounts, config, login, logout, usage, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// EPBMeter CLI - EPB electricity usage monitoring.
#[derive(Parser)]
#[command(name = "epbmeter")]
#[command(about = "EPB electricity usage monitoring CLI")]
#[command(long_about = r"
EPBMeter reports electricity usage and cost for the accounts linked to an
EPB customer portal login.

Credentials are read from EPB_USERNAME and EPB_PASSWORD, or from the system
keychain after `epbmeter login`.

Examples:
  epbmeter                                  # Current period, all accounts
  epbmeter accounts                         # Linked accounts
  epbmeter usage --year 2024 --month 12     # A past billing period
  epbmeter --format json                    # JSON output
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Verify credentials and store them in the keychain.
    Login(login::LoginArgs),

    /// Remove stored credentials.
    Logout,

    /// List linked accounts.
    #[command(visible_alias = "a")]
    Accounts,

    /// Fetch usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Poll usage on an interval.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Credentials missing or rejected.
    AuthFailed = 2,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    fn for_error(err: &anyhow::Error) -> Self {
        let auth = err.chain().any(|cause| {
            cause.downcast_ref::<StoreError>().is_some_and(StoreError::is_auth)
                || matches!(cause.downcast_ref::<EpbError>(), Some(EpbError::Auth(_)))
        });
        if auth { Self::AuthFailed } else { Self::Error }
    }
}

impl Cli {
    /// Path of the config file in use.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("epbmeter=debug,info")
    } else {
        EnvFilter::new(format!("epbmeter={level}"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Config::load_from(&cli.config_path()).await {
        Ok(config) => {
            setup_logging(cli.verbose, cli.quiet, &config.general.log_level);
            dispatch(&cli, &config).await
        }
        // `config path` and `config init` must work with a broken file.
        Err(e) => match &cli.command {
            Some(Commands::Config(args)) if !args.needs_valid_config() => {
                setup_logging(cli.verbose, cli.quiet, "warn");
                dispatch(&cli, &Config::default()).await
            }
            _ => Err(anyhow::Error::new(e).context("Failed to load configuration")),
        },
    };

    let code = match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::for_error(&e)
        }
    };
    std::process::exit(code as i32);
}

async fn dispatch(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Some(Commands::Login(args)) => login::run(args, cli, config).await,
        Some(Commands::Logout) => logout::run(cli).await,
        Some(Commands::Accounts) => accounts::run(cli, config).await,
        Some(Commands::Usage(args)) => usage::run(args, cli, config).await,
        Some(Commands::Watch(args)) => watch::run(args, cli, config).await,
        Some(Commands::Config(args)) => config::run(args, cli, config).await,
        None => usage::run(&usage::UsageArgs::default(), cli, config).await,
    }
}
