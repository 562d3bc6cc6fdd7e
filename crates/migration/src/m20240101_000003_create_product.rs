//! Create `product` table.
//! Gallery, specifications and tags live in JSONB columns on the row.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(string_len(Product::Name, 200).not_null())
                    .col(string_len(Product::Slug, 96).not_null().unique_key())
                    .col(text_null(Product::Summary))
                    .col(text_null(Product::Description))
                    .col(uuid_null(Product::CategoryId))
                    .col(json_binary(Product::Images).not_null())
                    .col(json_binary(Product::Specifications).not_null())
                    .col(json_binary(Product::Tags).not_null())
                    .col(boolean(Product::Featured).not_null().default(false))
                    .col(boolean(Product::Published).not_null().default(false))
                    .col(integer(Product::SortOrder).not_null().default(0))
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Product::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_category")
                            .from(Product::Table, Product::CategoryId)
                            .to(ProductCategory::Table, ProductCategory::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    Name,
    Slug,
    Summary,
    Description,
    CategoryId,
    Images,
    Specifications,
    Tags,
    Featured,
    Published,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductCategory { Table, Id }
