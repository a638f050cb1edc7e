//! Watch command - poll usage on an interval.

use std::io::{Write, stdout};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use epbmeter_store::{Config, StoreError, UsageStore};
use tokio::time::{Duration, interval};
use tracing::{info, warn};

use crate::commands::client_from_store;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (defaults to the configured interval).
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Minimum interval to use.
    #[arg(long, default_value = "60")]
    pub min_interval: u64,
}

/// Runs the watch command until interrupted or credentials are rejected.
pub async fn run(args: &WatchArgs, cli: &Cli, config: &Config) -> Result<()> {
    let refresh_interval = args
        .interval
        .unwrap_or(config.general.refresh_interval_secs)
        .max(args.min_interval)
        .max(1);

    info!(interval = refresh_interval, "Starting watch mode");

    let client = client_from_store(config).await?;
    let store = UsageStore::new(Arc::new(client));

    let text = TextFormatter::new(!cli.no_color);
    let json = JsonFormatter::new(cli.pretty);

    let mut ticker = interval(Duration::from_secs(refresh_interval));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch mode");
                return Ok(());
            }
        }

        let result = store.refresh().await;

        match cli.format {
            OutputFormat::Text => {
                print!("\x1b[2J\x1b[H");
                println!("{}", text.format_watch_header(chrono::Local::now(), refresh_interval));
                println!();
                match &result {
                    Ok(usages) => println!("{}", text.format_usage_report(usages, None)),
                    Err(e) => println!("{}", text.format_error("Refresh", &e.to_string())),
                }
                println!();
                println!("Press Ctrl+C to exit");
            }
            OutputFormat::Json => {
                if let Ok(usages) = &result {
                    println!("{}", json.format_usage(usages, None)?);
                }
            }
        }
        stdout().flush()?;

        match result {
            Err(e @ StoreError::AuthFailed(_)) => return Err(e.into()),
            Err(e) => warn!(error = %e, "Refresh failed, will retry next cycle"),
            Ok(_) => {}
        }
    }
}
