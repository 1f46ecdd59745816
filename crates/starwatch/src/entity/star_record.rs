//! StarRecord entity - membership of a repository in a user's star list.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One starred repository for one user.
///
/// Membership mirrors the remote star list as of the last successful
/// reconciliation for the user; rows are added and removed freely.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_stars")]
pub struct Model {
    /// User login on the hosting platform.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user: String,
    /// Repository full name (`owner/name`).
    #[sea_orm(primary_key, auto_increment = false)]
    pub repository: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
