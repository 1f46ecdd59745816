//! Fetch pass command.

use console::style;

use starwatch::store::Store;
use starwatch::sync::{self, BudgetGate};

use crate::commands::shared::github_source;
use crate::config::Config;
use crate::progress::LoggingReporter;

/// Handle the fetch command: one budget-gated pass over every tracked
/// repository.
pub(crate) async fn handle_fetch(
    threshold: Option<u32>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(database_url).await?;
    let source = github_source(config)?;
    let gate = BudgetGate::new(threshold.unwrap_or(config.fetch.budget_threshold));
    let on_progress = LoggingReporter::into_callback();

    let result = sync::fetch_all(&source, &store, &store, &gate, Some(&on_progress)).await?;

    println!(
        "{} {} repositories processed, {} updated, {} new versions",
        style("✓").green(),
        result.processed,
        result.updated,
        result.discovered,
    );
    if result.skipped_gone > 0 {
        println!(
            "{} {} repositories are gone upstream (history kept)",
            style("!").yellow(),
            result.skipped_gone,
        );
    }
    if !result.errors.is_empty() {
        eprintln!(
            "{} {} repositories failed and will be retried next pass:",
            style("!").yellow(),
            result.errors.len(),
        );
        for error in &result.errors {
            eprintln!("    {error}");
        }
    }

    Ok(())
}
