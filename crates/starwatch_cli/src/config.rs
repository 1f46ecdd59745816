//! Configuration file support for starwatch.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STARWATCH_`)
//! 3. Config file (~/.config/starwatch/config.toml or ./starwatch.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! # sqlite://, postgres:// or redb://
//! url = "sqlite://~/.local/state/starwatch/starwatch.db"
//!
//! [github]
//! token = "ghp_..."  # or STARWATCH_GITHUB_TOKEN / GITHUB_ACCESS_TOKEN
//!
//! [fetch]
//! budget_threshold = 1000
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use starwatch::sync::DEFAULT_BUDGET_THRESHOLD;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// Fetch pass configuration.
    pub fetch: FetchConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL. Supports sqlite://, postgres:// and redb:// schemes.
    /// Defaults to `sqlite://~/.local/state/starwatch/starwatch.db` if unset.
    pub url: Option<String>,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub personal access token.
    /// Can also be set via STARWATCH_GITHUB_TOKEN or the legacy
    /// GITHUB_ACCESS_TOKEN environment variable.
    pub token: Option<String>,
}

/// Fetch pass configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Pause the pass while the remaining API budget is below this.
    pub budget_threshold: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            budget_threshold: DEFAULT_BUDGET_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then config files, then environment.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "starwatch") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("starwatch.toml");
        if local_config.exists() {
            tracing::debug!("loading config from ./starwatch.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // STARWATCH_DATABASE_URL -> database.url, etc.
        builder = builder.add_source(
            Environment::with_prefix("STARWATCH")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// The database URL, falling back to the default state directory path.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("starwatch.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// The GitHub token, with the legacy environment variable as fallback.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_ACCESS_TOKEN").ok())
    }

    /// The default state directory.
    ///
    /// On Linux this is `$XDG_STATE_HOME/starwatch` or
    /// `~/.local/state/starwatch`; macOS and Windows fall back to the data
    /// directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "starwatch").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

/// Create the parent directory for file-backed databases.
pub fn ensure_database_dir(database_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = database_url.strip_prefix("sqlite://") {
        // Strip query parameters (e.g. ?mode=rwc) before path operations.
        path.split('?').next().unwrap_or(path)
    } else if let Some(path) = database_url.strip_prefix("redb://") {
        path
    } else {
        return Ok(());
    };

    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
