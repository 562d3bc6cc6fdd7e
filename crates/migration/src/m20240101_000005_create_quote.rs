//! Create `quote` table.
//! Customer quote requests; `details` keeps the wizard answers verbatim.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quote::Table)
                    .if_not_exists()
                    .col(uuid(Quote::Id).primary_key())
                    .col(string_len(Quote::Name, 120).not_null())
                    .col(string_len(Quote::Email, 254).not_null())
                    .col(string_len_null(Quote::Phone, 40))
                    .col(string_len_null(Quote::Company, 160))
                    .col(uuid_null(Quote::ProductId))
                    .col(string_len_null(Quote::ProductName, 200))
                    .col(integer_null(Quote::Quantity))
                    .col(text(Quote::Message).not_null())
                    .col(json_binary(Quote::Details).not_null())
                    .col(string_len(Quote::Status, 16).not_null().default("pending"))
                    .col(text_null(Quote::AdminNotes))
                    .col(timestamp_with_time_zone(Quote::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Quote::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quote_product")
                            .from(Quote::Table, Quote::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Quote::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Quote {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Company,
    ProductId,
    ProductName,
    Quantity,
    Message,
    Details,
    Status,
    AdminNotes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Product { Table, Id }
