//! Key-value storage backend on redb.
//!
//! Tables and the access paths they serve:
//!
//! - `versions ((repository, version) -> created_at_micros)` - point lookup
//!   and per-repository existence sets.
//! - `versions_by_date ((repository, created_at_micros, version) -> ())` -
//!   secondary index; the newest version of a repository is the last entry
//!   of a range scan bounded to the repository prefix. The store cannot
//!   join across partitions, so bulk latest queries are one range scan per
//!   repository (`LatestStrategy::PartitionedFanOut`).
//! - `user_stars ((user, repository) -> ())` - star membership.
//!
//! redb is synchronous; every operation runs on the blocking thread pool
//! with the database handle shared behind an `Arc`.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};

use super::errors::{Result, StoreError};
use super::{LatestStrategy, StarStore, VersionEntry, VersionRecord, VersionStore};

const VERSIONS: TableDefinition<(&str, &str), i64> = TableDefinition::new("versions");
const VERSIONS_BY_DATE: TableDefinition<(&str, i64, &str), ()> =
    TableDefinition::new("versions_by_date");
const USER_STARS: TableDefinition<(&str, &str), ()> = TableDefinition::new("user_stars");

/// redb-backed implementation of the storage contract.
#[derive(Clone, Debug)]
pub struct KvStore {
    db: Arc<Database>,
}

impl KvStore {
    /// Open (or create) the store at the given path and ensure all tables
    /// exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = tokio::task::spawn_blocking(move || -> Result<Database> {
            let db = Database::create(path)?;
            let txn = db.begin_write()?;
            {
                txn.open_table(VERSIONS)?;
                txn.open_table(VERSIONS_BY_DATE)?;
                txn.open_table(USER_STARS)?;
            }
            txn.commit()?;
            Ok(db)
        })
        .await??;

        Ok(Self { db: Arc::new(db) })
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db)).await?
    }
}

/// Exclusive upper bound for a string prefix in a lexicographically ordered
/// tuple key: `"repo" < x < "repo\0"` holds for no x, so the half-open range
/// `(prefix, ..) .. (prefix + "\0", ..)` covers exactly one partition.
fn prefix_end(prefix: &str) -> String {
    let mut end = prefix.to_string();
    end.push('\0');
    end
}

fn micros_to_datetime(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::corrupt(format!("timestamp out of range: {micros}")))
}

/// Newest record in one repository partition: last entry of the bounded
/// range scan over the by-date index.
fn latest_in_partition(
    index: &impl ReadableTable<(&'static str, i64, &'static str), ()>,
    repository: &str,
) -> Result<Option<VersionRecord>> {
    let end = prefix_end(repository);
    let mut range = index.range((repository, i64::MIN, "")..(end.as_str(), i64::MIN, ""))?;

    match range.next_back() {
        Some(entry) => {
            let (guard, _) = entry?;
            let (repo, micros, version) = guard.value();
            Ok(Some(VersionRecord {
                repository: repo.to_string(),
                version: version.to_string(),
                created_at: micros_to_datetime(micros)?,
            }))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl VersionStore for KvStore {
    async fn existing_versions(&self, repository: &str) -> Result<BTreeSet<String>> {
        let repository = repository.to_string();
        self.run(move |db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(VERSIONS)?;
            let end = prefix_end(&repository);

            let mut versions = BTreeSet::new();
            for entry in table.range((repository.as_str(), "")..(end.as_str(), ""))? {
                let (guard, _) = entry?;
                let (_, version) = guard.value();
                versions.insert(version.to_string());
            }
            Ok(versions)
        })
        .await
    }

    async fn append_versions(&self, repository: &str, entries: &[VersionEntry]) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let repository = repository.to_string();
        let entries = entries.to_vec();
        self.run(move |db| {
            let txn = db.begin_write()?;
            let mut inserted = 0u64;
            {
                let mut versions = txn.open_table(VERSIONS)?;
                let mut by_date = txn.open_table(VERSIONS_BY_DATE)?;

                for entry in &entries {
                    let key = (repository.as_str(), entry.version.as_str());
                    // Insert-if-absent: the first observed date wins.
                    if versions.get(key)?.is_some() {
                        continue;
                    }
                    let micros = entry.created_at.timestamp_micros();
                    versions.insert(key, micros)?;
                    by_date.insert((repository.as_str(), micros, entry.version.as_str()), ())?;
                    inserted += 1;
                }
            }
            txn.commit()?;
            Ok(inserted)
        })
        .await
    }

    async fn latest_for_repository(&self, repository: &str) -> Result<Option<VersionRecord>> {
        let repository = repository.to_string();
        self.run(move |db| {
            let txn = db.begin_read()?;
            let index = txn.open_table(VERSIONS_BY_DATE)?;
            latest_in_partition(&index, &repository)
        })
        .await
    }

    async fn latest_per_repository(&self, repositories: &[String]) -> Result<Vec<VersionRecord>> {
        if repositories.is_empty() {
            return Ok(Vec::new());
        }

        let repositories = repositories.to_vec();
        self.run(move |db| {
            let txn = db.begin_read()?;
            let index = txn.open_table(VERSIONS_BY_DATE)?;

            let mut records = Vec::with_capacity(repositories.len());
            for repository in &repositories {
                if let Some(record) = latest_in_partition(&index, repository)? {
                    records.push(record);
                }
            }
            Ok(records)
        })
        .await
    }

    fn latest_strategy(&self) -> LatestStrategy {
        LatestStrategy::PartitionedFanOut
    }
}

#[async_trait]
impl StarStore for KvStore {
    async fn current_stars(&self, user: &str) -> Result<BTreeSet<String>> {
        let user = user.to_string();
        self.run(move |db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(USER_STARS)?;
            let end = prefix_end(&user);

            let mut stars = BTreeSet::new();
            for entry in table.range((user.as_str(), "")..(end.as_str(), ""))? {
                let (guard, _) = entry?;
                let (_, repository) = guard.value();
                stars.insert(repository.to_string());
            }
            Ok(stars)
        })
        .await
    }

    async fn apply_diff(
        &self,
        user: &str,
        to_add: &BTreeSet<String>,
        to_remove: &BTreeSet<String>,
    ) -> Result<()> {
        if to_add.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        let user = user.to_string();
        let to_add = to_add.clone();
        let to_remove = to_remove.clone();
        self.run(move |db| {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(USER_STARS)?;
                for repository in &to_remove {
                    table.remove((user.as_str(), repository.as_str()))?;
                }
                for repository in &to_add {
                    table.insert((user.as_str(), repository.as_str()), ())?;
                }
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn all_tracked_repositories(&self) -> Result<BTreeSet<String>> {
        self.run(move |db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(USER_STARS)?;

            let mut tracked = BTreeSet::new();
            for entry in table.iter()? {
                let (guard, _) = entry?;
                let (_, repository) = guard.value();
                tracked.insert(repository.to_string());
            }
            Ok(tracked)
        })
        .await
    }
}
