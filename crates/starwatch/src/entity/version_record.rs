//! VersionRecord entity - one row per observed release or tag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single observed version of a repository.
///
/// Rows are insert-only: once a `(repository, version)` pair has been
/// recorded its `created_at` is never overwritten, and rows survive the
/// repository being unstarred so history is intact if it is starred again.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "versions")]
pub struct Model {
    /// Repository full name (`owner/name`).
    #[sea_orm(primary_key, auto_increment = false)]
    pub repository: String,
    /// Version identifier - a release tag or plain tag name.
    #[sea_orm(primary_key, auto_increment = false)]
    pub version: String,
    /// Publish date of the release, or the tag's resolved date.
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
