//! Rate budget display command.

use tabled::Tabled;

use starwatch::remote::{RateBudget, ReleaseSource};

use crate::commands::shared::{format_duration, github_source, OutputFormat};
use crate::config::Config;

/// Rate budget information for display.
#[derive(Debug, Clone, serde::Serialize, Tabled)]
pub(crate) struct BudgetDisplay {
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
}

impl BudgetDisplay {
    pub(crate) fn from_budget(budget: &RateBudget) -> Self {
        let used = budget.limit.saturating_sub(budget.remaining);
        let usage_percent = if budget.limit > 0 {
            (used as f64 / budget.limit as f64) * 100.0
        } else {
            0.0
        };

        let now = chrono::Utc::now();
        let reset_duration = budget.reset_at.signed_duration_since(now);
        let reset_in = if reset_duration.num_seconds() > 0 {
            format_duration(reset_duration)
        } else {
            "now".to_string()
        };

        Self {
            limit: budget.limit.to_string(),
            remaining: budget.remaining.to_string(),
            usage_percent: format!("{:.1}%", usage_percent),
            reset_at: budget.reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
        }
    }

    pub(crate) fn print(self, format: OutputFormat) {
        match format {
            OutputFormat::Table => {
                let mut table = tabled::Table::new(vec![self]);
                table.with(tabled::settings::Style::rounded());
                println!("{}", table);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&self).unwrap());
            }
        }
    }
}

/// Handle the limits command.
pub(crate) async fn handle_limits(
    output: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = github_source(config)?;
    let budget = source.rate_budget().await?;
    BudgetDisplay::from_budget(&budget).print(output);
    Ok(())
}
