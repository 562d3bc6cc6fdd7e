//! Migrator registering table migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_admin_user;
mod m20240101_000002_create_product_category;
mod m20240101_000003_create_product;
mod m20240101_000004_create_blog_post;
mod m20240101_000005_create_quote;
mod m20240101_000006_create_contact_message;
mod m20240101_000010_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_admin_user::Migration),
            Box::new(m20240101_000002_create_product_category::Migration),
            Box::new(m20240101_000003_create_product::Migration),
            Box::new(m20240101_000004_create_blog_post::Migration),
            Box::new(m20240101_000005_create_quote::Migration),
            Box::new(m20240101_000006_create_contact_message::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000010_add_indexes::Migration),
        ]
    }
}
