//! Backend-neutral storage contract for version and star records.
//!
//! Two backends implement the same contract: a SQL backend (SeaORM over
//! SQLite/Postgres) and a key-value backend (redb). They differ only in the
//! physical plan for the "newest version per repository" query: the SQL
//! backend answers it with one combined query, while the key-value backend
//! exposes a bounded top-1 range query per repository partition and lets the
//! query aggregator fan out (see [`LatestStrategy`]).

mod errors;
mod kv;
mod sql;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use errors::{Result, StoreError};
pub use kv::KvStore;
pub use sql::SqlStore;

/// A recorded `(repository, version)` pair with its resolved date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    /// Repository full name (`owner/name`).
    pub repository: String,
    /// Version identifier - a release tag or plain tag name.
    pub version: String,
    /// Publish date of the release, or the tag's resolved date.
    pub created_at: DateTime<Utc>,
}

/// A newly observed version, staged for [`VersionStore::append_versions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: String,
    pub created_at: DateTime<Utc>,
}

/// How a backend answers "newest version per repository" queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatestStrategy {
    /// The backend resolves the whole repository set in one combined query.
    Combined,
    /// The backend only supports one bounded top-1 range query per
    /// repository partition; the caller fans out and merges.
    PartitionedFanOut,
}

/// Durable keyed storage for `(repository, version) -> created_at` rows.
///
/// Rows are insert-only: appends are idempotent and never overwrite the
/// `created_at` of an existing pair, so repeated or concurrent sync passes
/// converge on the same state.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// All version identifiers already recorded for a repository.
    /// An unknown repository yields an empty set, not an error.
    async fn existing_versions(&self, repository: &str) -> Result<BTreeSet<String>>;

    /// Insert-if-absent for each entry. Returns the number of rows actually
    /// inserted; pairs that already exist are left untouched.
    async fn append_versions(&self, repository: &str, entries: &[VersionEntry]) -> Result<u64>;

    /// The single record with the maximum `created_at` for one repository,
    /// ties broken by version string descending so repeated calls agree.
    async fn latest_for_repository(&self, repository: &str) -> Result<Option<VersionRecord>>;

    /// One record per repository that has at least one row; repositories
    /// with no rows are omitted. Order is unspecified.
    async fn latest_per_repository(&self, repositories: &[String]) -> Result<Vec<VersionRecord>>;

    /// The physical query plan this backend wants for latest queries.
    fn latest_strategy(&self) -> LatestStrategy;
}

/// Durable keyed storage for `(user, repository)` star membership.
#[async_trait]
pub trait StarStore: Send + Sync {
    /// Full names of all repositories currently recorded as starred by a user.
    async fn current_stars(&self, user: &str) -> Result<BTreeSet<String>>;

    /// Apply a star-list diff. Both directions are idempotent: re-adding an
    /// existing member and re-removing an absent one are no-ops, so a
    /// partially applied diff converges on the next reconciliation.
    async fn apply_diff(
        &self,
        user: &str,
        to_add: &BTreeSet<String>,
        to_remove: &BTreeSet<String>,
    ) -> Result<()>;

    /// Union of every user's starred repositories, deduplicated, so a
    /// repository shared by several users is fetched once per pass.
    async fn all_tracked_repositories(&self) -> Result<BTreeSet<String>>;
}

/// Convenience supertrait for callers that need both record kinds.
pub trait RecordStore: VersionStore + StarStore {}

impl<T: VersionStore + StarStore> RecordStore for T {}

/// A concrete store selected from a database URL.
///
/// `sqlite://` and `postgres://` URLs open the SQL backend (running any
/// pending migrations); `redb://` opens the key-value backend at the given
/// path, creating the file and tables on first use.
#[derive(Debug)]
pub enum Store {
    Sql(SqlStore),
    Kv(KvStore),
}

impl Store {
    /// Open a store from a database URL.
    pub async fn open(database_url: &str) -> Result<Self> {
        if database_url.starts_with("sqlite://") || database_url.starts_with("postgres://") {
            Ok(Self::Sql(SqlStore::connect(database_url).await?))
        } else if let Some(path) = database_url.strip_prefix("redb://") {
            Ok(Self::Kv(KvStore::open(path).await?))
        } else {
            Err(StoreError::UnsupportedUrl {
                url: database_url.to_string(),
            })
        }
    }
}

#[async_trait]
impl VersionStore for Store {
    async fn existing_versions(&self, repository: &str) -> Result<BTreeSet<String>> {
        match self {
            Self::Sql(s) => s.existing_versions(repository).await,
            Self::Kv(s) => s.existing_versions(repository).await,
        }
    }

    async fn append_versions(&self, repository: &str, entries: &[VersionEntry]) -> Result<u64> {
        match self {
            Self::Sql(s) => s.append_versions(repository, entries).await,
            Self::Kv(s) => s.append_versions(repository, entries).await,
        }
    }

    async fn latest_for_repository(&self, repository: &str) -> Result<Option<VersionRecord>> {
        match self {
            Self::Sql(s) => s.latest_for_repository(repository).await,
            Self::Kv(s) => s.latest_for_repository(repository).await,
        }
    }

    async fn latest_per_repository(&self, repositories: &[String]) -> Result<Vec<VersionRecord>> {
        match self {
            Self::Sql(s) => s.latest_per_repository(repositories).await,
            Self::Kv(s) => s.latest_per_repository(repositories).await,
        }
    }

    fn latest_strategy(&self) -> LatestStrategy {
        match self {
            Self::Sql(s) => s.latest_strategy(),
            Self::Kv(s) => s.latest_strategy(),
        }
    }
}

#[async_trait]
impl StarStore for Store {
    async fn current_stars(&self, user: &str) -> Result<BTreeSet<String>> {
        match self {
            Self::Sql(s) => s.current_stars(user).await,
            Self::Kv(s) => s.current_stars(user).await,
        }
    }

    async fn apply_diff(
        &self,
        user: &str,
        to_add: &BTreeSet<String>,
        to_remove: &BTreeSet<String>,
    ) -> Result<()> {
        match self {
            Self::Sql(s) => s.apply_diff(user, to_add, to_remove).await,
            Self::Kv(s) => s.apply_diff(user, to_add, to_remove).await,
        }
    }

    async fn all_tracked_repositories(&self) -> Result<BTreeSet<String>> {
        match self {
            Self::Sql(s) => s.all_tracked_repositories().await,
            Self::Kv(s) => s.all_tracked_repositories().await,
        }
    }
}
