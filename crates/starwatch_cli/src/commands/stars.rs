//! Star-list mirroring command.

use console::style;

use starwatch::store::Store;
use starwatch::sync;

use crate::commands::shared::github_source;
use crate::config::Config;

/// Handle the fetch-user command: mirror each user's star list.
pub(crate) async fn handle_fetch_user(
    users: &[String],
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(database_url).await?;
    let source = github_source(config)?;

    for user in users {
        let result = sync::sync_stars(&source, &store, user).await?;
        println!(
            "{} {}: {} starred, {} added, {} removed",
            style("✓").green(),
            style(user).bold(),
            result.remote_total,
            result.added,
            result.removed,
        );
    }

    Ok(())
}
