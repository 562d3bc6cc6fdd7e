//! Create `product_category` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductCategory::Table)
                    .if_not_exists()
                    .col(uuid(ProductCategory::Id).primary_key())
                    .col(string_len(ProductCategory::Name, 120).not_null())
                    .col(string_len(ProductCategory::Slug, 96).not_null().unique_key())
                    .col(text_null(ProductCategory::Description))
                    .col(integer(ProductCategory::SortOrder).not_null().default(0))
                    .col(timestamp_with_time_zone(ProductCategory::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ProductCategory::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ProductCategory::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ProductCategory {
    Table,
    Id,
    Name,
    Slug,
    Description,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}
