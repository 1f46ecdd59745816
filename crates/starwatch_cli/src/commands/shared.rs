//! Helpers shared by the command handlers.

use clap::ValueEnum;

use starwatch::remote::github::GitHubSource;

use crate::config::Config;

/// Output format for tabular commands.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Build an authenticated GitHub source from the configuration.
pub(crate) fn github_source(config: &Config) -> Result<GitHubSource, Box<dyn std::error::Error>> {
    let token = config.github_token().ok_or(
        "no GitHub token configured; set STARWATCH_GITHUB_TOKEN or add [github] token to the config file",
    )?;
    Ok(GitHubSource::new(&token)?)
}

/// Format a duration in a human-readable way.
pub(crate) fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}
