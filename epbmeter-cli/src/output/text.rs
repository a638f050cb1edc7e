//! Text output formatting with colors.

use chrono::{DateTime, Local};
use epbmeter_core::{AccountLink, BillingPeriod};
use epbmeter_store::AccountUsage;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats usage for one account.
    pub fn format_usage(&self, usage: &AccountUsage) -> String {
        let mut lines = Vec::new();

        let location = format_location(
            usage.service_address.as_deref(),
            usage.city.as_deref(),
            usage.state.as_deref(),
            usage.zip_code.as_deref(),
        );
        let title = self.bold(&format!("Account {}", usage.account_id));
        match location {
            Some(location) => lines.push(format!("{title}  {}", self.dim(&location))),
            None => lines.push(title),
        }

        match (&usage.reading, &usage.error) {
            (Some(reading), _) if usage.has_usage_data => {
                lines.push(format!("  Energy: {}", self.cyan(&format!("{:.1} kWh", reading.kwh))));
                let mut cost = format!("  Cost:   {}", self.green(&format!("${:.2}", reading.cost)));
                if let Some(rate) = reading.cost_per_kwh() {
                    cost.push_str(&format!(" {}", self.dim(&format!("(${rate:.3}/kWh)"))));
                }
                lines.push(cost);
                if reading.is_zero() {
                    lines.push(format!("  {}", self.dim("No usage reported for this period")));
                }
            }
            (_, Some(error)) => lines.push(format!("  {} - {}", self.red("Error"), error)),
            _ => lines.push(format!("  {}", self.dim("No data"))),
        }

        lines.join("\n")
    }

    /// Formats usage for all accounts under a header.
    pub fn format_usage_report(
        &self,
        usages: &[AccountUsage],
        period: Option<BillingPeriod>,
    ) -> String {
        let mut lines = Vec::new();

        let header = match period {
            Some(period) => format!("EPB Usage - {period}"),
            None => "EPB Usage".to_string(),
        };
        lines.push(self.bold(&header));
        lines.push("─".repeat(40));

        if usages.is_empty() {
            lines.push(self.dim("No linked accounts found"));
            return lines.join("\n");
        }

        let blocks: Vec<String> = usages.iter().map(|u| self.format_usage(u)).collect();
        lines.push(blocks.join("\n\n"));

        lines.join("\n")
    }

    /// Formats the linked account list.
    pub fn format_accounts(&self, links: &[AccountLink]) -> String {
        if links.is_empty() {
            return self.dim("No linked accounts found");
        }

        let mut lines = vec![
            format!("{:<14} {:<12} {}", self.bold("Account"), self.bold("GIS ID"), self.bold("Premise")),
        ];
        for link in links {
            let location = format_location(
                link.service_address(),
                link.city(),
                link.state(),
                link.zip_code(),
            );
            lines.push(format!(
                "{:<14} {:<12} {}",
                link.account_id(),
                link.gis_id().unwrap_or("−"),
                location.unwrap_or_else(|| "−".to_string())
            ));
        }

        lines.join("\n")
    }

    /// Formats the watch mode banner.
    pub fn format_watch_header(&self, now: DateTime<Local>, interval_secs: u64) -> String {
        format!(
            "{} - {} (refresh: {}s)\n{}",
            self.bold("EPBMeter Watch Mode"),
            now.format("%H:%M:%S"),
            interval_secs,
            "─".repeat(50)
        )
    }

    /// Formats an error message.
    pub fn format_error(&self, label: &str, error: &str) -> String {
        format!("{}: {} - {}", self.bold(label), self.red("Error"), error)
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// Joins premise parts as "street, city, ST zip".
pub fn format_location(
    address: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    zip: Option<&str>,
) -> Option<String> {
    let region = [state, zip]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let parts: Vec<&str> = [address, city, Some(region.as_str())]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
