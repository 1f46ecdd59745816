//! Starwatch CLI - track the newest release of every starred repository.

mod commands;
mod config;
mod progress;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::OutputFormat;

#[derive(Parser)]
#[command(name = "starwatch")]
#[command(version)]
#[command(about = "Track the newest release or tag of every starred repository")]
#[command(
    long_about = "Starwatch mirrors the star lists of one or more GitHub users into a local \
database and records the newest release (or tag) of every starred repository, \
so that \"what changed since I last looked\" never costs an API call."
)]
#[command(after_long_help = r#"EXAMPLES
    Mirror a user's star list:
        $ starwatch fetch-user gaul

    Refresh versions for everything tracked (rate-limit aware):
        $ starwatch fetch

    Show the newest version of each starred repository:
        $ starwatch latest gaul

    Check the remaining API budget:
        $ starwatch limits

CONFIGURATION
    Starwatch reads configuration from:
      1. ~/.config/starwatch/config.toml (or $XDG_CONFIG_HOME/starwatch/config.toml)
      2. ./starwatch.toml
      3. Environment variables (STARWATCH_* prefix)
      4. .env file in the current directory

ENVIRONMENT VARIABLES
    STARWATCH_DATABASE_URL    Database URL: sqlite://, postgres:// or redb://
                              (default: sqlite://~/.local/state/starwatch/starwatch.db)
    STARWATCH_GITHUB_TOKEN    GitHub personal access token
    GITHUB_ACCESS_TOKEN       Legacy token variable, used when the above is unset
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize or upgrade the database schema
    Migrate,
    /// Mirror one or more users' star lists into the database
    FetchUser {
        /// GitHub login(s) whose stars to mirror
        #[arg(required = true)]
        users: Vec<String>,
    },
    /// Refresh versions for every tracked repository
    Fetch {
        /// Pause the pass while the remaining API budget is below this
        /// (default from config or 1000)
        #[arg(short, long)]
        threshold: Option<u32>,
    },
    /// Show the newest recorded version of each starred repository
    Latest {
        /// GitHub login to aggregate for
        user: String,

        /// Newest first instead of oldest first
        #[arg(short, long)]
        reverse: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Show the current API rate budget
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("starwatch=info,starwatch_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load();
    let cli = Cli::parse();

    // Completions need no database.
    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell);
        return Ok(());
    }

    let database_url = config
        .database_url()
        .ok_or("could not determine a database URL")?;
    config::ensure_database_dir(&database_url)?;

    match cli.command {
        Commands::Migrate => {
            commands::migrate::handle_migrate(&database_url).await?;
        }
        Commands::FetchUser { users } => {
            commands::stars::handle_fetch_user(&users, &config, &database_url).await?;
        }
        Commands::Fetch { threshold } => {
            commands::fetch::handle_fetch(threshold, &config, &database_url).await?;
        }
        Commands::Latest {
            user,
            reverse,
            output,
        } => {
            commands::latest::handle_latest(&user, reverse, output, &database_url).await?;
        }
        Commands::Limits { output } => {
            commands::limits::handle_limits(output, &config).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
