use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Product: filter by category, list published in display order
        manager
            .create_index(
                Index::create()
                    .name("idx_product_category")
                    .table(Product::Table)
                    .col(Product::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_product_published_sort")
                    .table(Product::Table)
                    .col(Product::Published)
                    .col(Product::SortOrder)
                    .to_owned(),
            )
            .await?;

        // BlogPost: public listing is (status, published_at desc)
        manager
            .create_index(
                Index::create()
                    .name("idx_blog_post_status_published")
                    .table(BlogPost::Table)
                    .col(BlogPost::Status)
                    .col(BlogPost::PublishedAt)
                    .to_owned(),
            )
            .await?;

        // Quote: admin inbox filtered by status, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_quote_status_created")
                    .table(Quote::Table)
                    .col(Quote::Status)
                    .col(Quote::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contact_message_read")
                    .table(ContactMessage::Table)
                    .col(ContactMessage::IsRead)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_product_category").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_published_sort").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_blog_post_status_published").table(BlogPost::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_quote_status_created").table(Quote::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_contact_message_read").table(ContactMessage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Product { Table, CategoryId, Published, SortOrder }

#[derive(DeriveIden)]
enum BlogPost { Table, Status, PublishedAt }

#[derive(DeriveIden)]
enum Quote { Table, Status, CreatedAt }

#[derive(DeriveIden)]
enum ContactMessage { Table, IsRead }
