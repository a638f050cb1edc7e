//! Usage command - fetch and display usage per account.

use anyhow::{Context, Result, bail};
use clap::Args;
use epbmeter_core::{AccountLink, BillingPeriod};
use epbmeter_store::{Config, fetch_usage};
use tracing::info;

use crate::commands::client_from_store;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the usage command.
#[derive(Args, Default)]
pub struct UsageArgs {
    /// Only this account number.
    #[arg(long, short)]
    pub account: Option<String>,

    /// Billing year (defaults to the current period).
    #[arg(long, requires = "month")]
    pub year: Option<i32>,

    /// Billing month, 1-12.
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl UsageArgs {
    fn period(&self, config: &Config) -> Result<BillingPeriod> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => Ok(BillingPeriod::new(year, month)?),
            _ => Ok(BillingPeriod::current(config.zone()?)),
        }
    }
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli, config: &Config) -> Result<()> {
    let period = args.period(config)?;
    let client = client_from_store(config).await?;

    let links = client
        .list_linked_accounts()
        .await
        .context("Failed to list linked accounts")?;
    let links = select_accounts(links, args.account.as_deref())?;

    info!(accounts = links.len(), period = %period, "Fetching usage");
    let usages = fetch_usage(&client, &links, Some(period)).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_usage_report(&usages, Some(period)));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_usage(&usages, Some(period))?);
        }
    }

    if !usages.is_empty() && usages.iter().all(|u| !u.has_usage_data) {
        bail!("Failed to fetch usage for every account");
    }

    Ok(())
}

/// Keeps only `account` when given.
fn select_accounts(links: Vec<AccountLink>, account: Option<&str>) -> Result<Vec<AccountLink>> {
    let Some(account) = account else {
        return Ok(links);
    };

    let selected: Vec<AccountLink> = links
        .into_iter()
        .filter(|link| link.account_id() == account)
        .collect();

    if selected.is_empty() {
        bail!("Account {account} is not linked to this login");
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<AccountLink> {
        vec![
            AccountLink::new("111", Some("g1".to_string())),
            AccountLink::new("222", None),
        ]
    }

    #[test]
    fn test_select_all_accounts() {
        assert_eq!(select_accounts(links(), None).unwrap().len(), 2);
    }

    #[test]
    fn test_select_one_account() {
        let selected = select_accounts(links(), Some("222")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].account_id(), "222");
    }

    #[test]
    fn test_select_unknown_account() {
        assert!(select_accounts(links(), Some("999")).is_err());
    }

    #[test]
    fn test_explicit_period() {
        let args = UsageArgs {
            account: None,
            year: Some(2024),
            month: Some(12),
        };
        let period = args.period(&Config::default()).unwrap();
        assert_eq!(period, BillingPeriod::new(2024, 12).unwrap());
    }
}
