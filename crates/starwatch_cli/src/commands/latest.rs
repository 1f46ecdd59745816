//! Latest-versions listing command.

use console::style;
use tabled::Tabled;

use starwatch::store::Store;
use starwatch::sync::{self, SortOrder};

use crate::commands::shared::OutputFormat;

/// One row of the latest-versions table.
#[derive(Debug, Clone, serde::Serialize, Tabled)]
pub(crate) struct LatestRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Date")]
    pub date: String,
}

/// Handle the latest command.
pub(crate) async fn handle_latest(
    user: &str,
    reverse: bool,
    output: OutputFormat,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(database_url).await?;
    let order = if reverse {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };

    let view = sync::latest_versions(&store, &store, user, order).await?;

    let rows: Vec<LatestRow> = view
        .rows
        .iter()
        .map(|record| LatestRow {
            repository: record.repository.clone(),
            version: record.version.clone(),
            date: record.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect();

    match output {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(&rows);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    if !view.is_complete() {
        eprintln!(
            "{} {} of {} lookups failed; the listing is incomplete",
            style("!").yellow(),
            view.failed,
            view.expected,
        );
    }

    Ok(())
}
