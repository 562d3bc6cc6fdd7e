//! Create `contact_message` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContactMessage::Table)
                    .if_not_exists()
                    .col(uuid(ContactMessage::Id).primary_key())
                    .col(string_len(ContactMessage::Name, 120).not_null())
                    .col(string_len(ContactMessage::Email, 254).not_null())
                    .col(string_len_null(ContactMessage::Phone, 40))
                    .col(string_len_null(ContactMessage::Subject, 200))
                    .col(text(ContactMessage::Message).not_null())
                    .col(boolean(ContactMessage::IsRead).not_null().default(false))
                    .col(timestamp_with_time_zone(ContactMessage::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ContactMessage::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ContactMessage {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Subject,
    Message,
    IsRead,
    CreatedAt,
}
