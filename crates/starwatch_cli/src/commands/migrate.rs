//! Schema initialization command.

use console::style;

use starwatch::store::Store;

/// Handle the migrate command.
///
/// Opening a store runs pending SQL migrations (or creates the key-value
/// tables), so this is a checked no-op when the schema is already current.
pub(crate) async fn handle_migrate(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    match Store::open(database_url).await? {
        Store::Sql(_) => {
            println!("{} database schema is up to date", style("✓").green());
        }
        Store::Kv(_) => {
            println!("{} key-value store initialized", style("✓").green());
        }
    }
    Ok(())
}
