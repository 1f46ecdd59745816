//! SQL storage backend on SeaORM (SQLite or Postgres).
//!
//! Natural composite keys do the deduplication work: appends are
//! `INSERT ... ON CONFLICT DO NOTHING` against the `(repository, version)`
//! primary key, and star diffs are keyed deletes plus conflict-ignoring
//! inserts against `(user, repository)`. The latest-per-repository query is
//! answered with one combined query over the repository set and reduced to
//! per-repository maxima.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use sea_orm_migration::MigratorTrait;

use crate::entity::prelude::*;
use crate::migration::Migrator;

use super::errors::Result;
use super::{LatestStrategy, StarStore, VersionEntry, VersionRecord, VersionStore};

/// Chunk size for `IN`-list filters, to keep individual statements bounded.
const FILTER_CHUNK: usize = 100;

/// SeaORM-backed implementation of the storage contract.
#[derive(Clone, Debug)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    /// Connect to a SQL database and run any pending migrations.
    ///
    /// SQLite connections additionally get WAL journaling, a 5 second busy
    /// timeout, and NORMAL synchronous mode.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = Database::connect(database_url).await?;

        if database_url.starts_with("sqlite://") {
            configure_sqlite(&db).await?;
        }

        Migrator::up(&db, None).await?;
        Ok(Self { db })
    }

    /// Wrap an existing connection (tests, embedders).
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Access the underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Configure SQLite pragmas for concurrent access.
async fn configure_sqlite(db: &DatabaseConnection) -> Result<()> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in [
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

// ─── Version Records ─────────────────────────────────────────────────────────

#[async_trait]
impl VersionStore for SqlStore {
    async fn existing_versions(&self, repository: &str) -> Result<BTreeSet<String>> {
        let versions: Vec<String> = VersionRecords::find()
            .filter(VersionRecordColumn::Repository.eq(repository))
            .select_only()
            .column(VersionRecordColumn::Version)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(versions.into_iter().collect())
    }

    async fn append_versions(&self, repository: &str, entries: &[VersionEntry]) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let models: Vec<VersionRecordActiveModel> = entries
            .iter()
            .map(|entry| VersionRecordActiveModel {
                repository: Set(repository.to_string()),
                version: Set(entry.version.clone()),
                created_at: Set(entry.created_at),
            })
            .collect();

        let inserted = VersionRecords::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    VersionRecordColumn::Repository,
                    VersionRecordColumn::Version,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted)
    }

    async fn latest_for_repository(&self, repository: &str) -> Result<Option<VersionRecord>> {
        let row = VersionRecords::find()
            .filter(VersionRecordColumn::Repository.eq(repository))
            .order_by_desc(VersionRecordColumn::CreatedAt)
            .order_by_desc(VersionRecordColumn::Version)
            .one(&self.db)
            .await?;

        Ok(row.map(record_from_model))
    }

    async fn latest_per_repository(&self, repositories: &[String]) -> Result<Vec<VersionRecord>> {
        if repositories.is_empty() {
            return Ok(Vec::new());
        }

        let mut latest: HashMap<String, VersionRecord> = HashMap::new();

        for chunk in repositories.chunks(FILTER_CHUNK) {
            let rows = VersionRecords::find()
                .filter(VersionRecordColumn::Repository.is_in(chunk.iter().cloned()))
                .all(&self.db)
                .await?;

            for row in rows {
                let record = record_from_model(row);
                match latest.get(&record.repository) {
                    Some(current)
                        if (current.created_at, &current.version)
                            >= (record.created_at, &record.version) => {}
                    _ => {
                        latest.insert(record.repository.clone(), record);
                    }
                }
            }
        }

        Ok(latest.into_values().collect())
    }

    fn latest_strategy(&self) -> LatestStrategy {
        LatestStrategy::Combined
    }
}

// ─── Star Records ────────────────────────────────────────────────────────────

#[async_trait]
impl StarStore for SqlStore {
    async fn current_stars(&self, user: &str) -> Result<BTreeSet<String>> {
        let repositories: Vec<String> = StarRecords::find()
            .filter(StarRecordColumn::User.eq(user))
            .select_only()
            .column(StarRecordColumn::Repository)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(repositories.into_iter().collect())
    }

    async fn apply_diff(
        &self,
        user: &str,
        to_add: &BTreeSet<String>,
        to_remove: &BTreeSet<String>,
    ) -> Result<()> {
        if !to_remove.is_empty() {
            let removals: Vec<&String> = to_remove.iter().collect();
            for chunk in removals.chunks(FILTER_CHUNK) {
                StarRecords::delete_many()
                    .filter(StarRecordColumn::User.eq(user))
                    .filter(StarRecordColumn::Repository.is_in(chunk.iter().map(|r| r.as_str())))
                    .exec(&self.db)
                    .await?;
            }
        }

        if !to_add.is_empty() {
            let models: Vec<StarRecordActiveModel> = to_add
                .iter()
                .map(|repository| StarRecordActiveModel {
                    user: Set(user.to_string()),
                    repository: Set(repository.clone()),
                })
                .collect();

            StarRecords::insert_many(models)
                .on_conflict(
                    OnConflict::columns([StarRecordColumn::User, StarRecordColumn::Repository])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await?;
        }

        Ok(())
    }

    async fn all_tracked_repositories(&self) -> Result<BTreeSet<String>> {
        let repositories: Vec<String> = StarRecords::find()
            .select_only()
            .column(StarRecordColumn::Repository)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(repositories.into_iter().collect())
    }
}

fn record_from_model(model: VersionRecordModel) -> VersionRecord {
    VersionRecord {
        repository: model.repository,
        version: model.version,
        created_at: model.created_at,
    }
}
