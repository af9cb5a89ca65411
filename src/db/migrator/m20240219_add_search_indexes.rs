use crate::entities::catalog_entries::Column;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Secondary indexes over the normalized lowercase columns used for
/// case-insensitive lookups (title search and taxonomy filters).
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, column) in [
            ("idx_catalog_entries_title_search", Column::TitleSearch),
            ("idx_catalog_entries_status_search", Column::StatusSearch),
            ("idx_catalog_entries_kind_search", Column::KindSearch),
            ("idx_catalog_entries_studio_search", Column::StudioSearch),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(CatalogEntries)
                        .col(column)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_catalog_entries_title_search",
            "idx_catalog_entries_status_search",
            "idx_catalog_entries_kind_search",
            "idx_catalog_entries_studio_search",
        ] {
            manager
                .drop_index(Index::drop().name(name).table(CatalogEntries).to_owned())
                .await?;
        }

        Ok(())
    }
}
