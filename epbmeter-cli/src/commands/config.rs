//! Config command - manage configuration.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use epbmeter_store::{Config, default_config_dir};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl ConfigArgs {
    /// Returns false for actions that work without a loadable config.
    pub fn needs_valid_config(&self) -> bool {
        matches!(self.action, ConfigAction::Show)
    }
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, config: &Config) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, config),
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init { force } => init_config(cli, *force).await,
    }
}

fn show_config(cli: &Cli, config: &Config) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            println!("EPBMeter Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API base URL:      {}", config.api.base_url);
            println!("Time zone:         {}", config.api.zone_id);
            println!("Request timeout:   {}s", config.api.timeout_secs);
            if let Some(domains) = &config.api.allowed_domains {
                println!("Allowed domains:   {}", domains.join(", "));
            }
            println!();
            println!("Energy charge:     ${:.4}/kWh", config.tariff.energy_charge_rate);
            println!("Fuel adjustment:   ${:.4}/kWh", config.tariff.fuel_cost_adjustment);
            println!("Customer charge:   ${:.2}", config.tariff.customer_charge);
            println!();
            println!("Refresh interval:  {}s", config.general.refresh_interval_secs);
            println!("Log level:         {}", config.general.log_level);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(config)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_path = cli.config_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = cli.config_path();

    if !force && tokio::fs::try_exists(&path).await? {
        bail!("{} already exists; use --force to overwrite", path.display());
    }

    Config::default().save_to(&path).await?;
    info!(path = %path.display(), "Wrote default configuration");

    if !cli.quiet {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
