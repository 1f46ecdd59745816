//! Initial migration to create the starwatch database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Versions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Versions::Repository).string().not_null())
                    .col(ColumnDef::new(Versions::Version).string().not_null())
                    .col(
                        ColumnDef::new(Versions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Versions::Repository)
                            .col(Versions::Version),
                    )
                    .to_owned(),
            )
            .await?;

        // Secondary access path for "newest version per repository" queries.
        manager
            .create_index(
                Index::create()
                    .name("idx_versions_repository_created_at")
                    .table(Versions::Table)
                    .col(Versions::Repository)
                    .col(Versions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserStars::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserStars::User).string().not_null())
                    .col(ColumnDef::new(UserStars::Repository).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserStars::User)
                            .col(UserStars::Repository),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserStars::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Versions::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Versions {
    Table,
    Repository,
    Version,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserStars {
    Table,
    User,
    Repository,
}
