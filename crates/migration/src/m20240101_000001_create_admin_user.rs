//! Create `admin_user` table.
//! Accounts allowed into the CMS; passwords are stored as argon2 PHC strings.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminUser::Table)
                    .if_not_exists()
                    .col(uuid(AdminUser::Id).primary_key())
                    .col(string_len(AdminUser::Email, 254).not_null().unique_key())
                    .col(string_len(AdminUser::Name, 120).not_null())
                    .col(string(AdminUser::PasswordHash).not_null())
                    .col(string_len(AdminUser::PasswordAlgorithm, 32).not_null())
                    .col(timestamp_with_time_zone(AdminUser::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(AdminUser::UpdatedAt).not_null())
                    .col(timestamp_with_time_zone_null(AdminUser::LastLoginAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AdminUser::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AdminUser {
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    PasswordAlgorithm,
    CreatedAt,
    UpdatedAt,
    LastLoginAt,
}
