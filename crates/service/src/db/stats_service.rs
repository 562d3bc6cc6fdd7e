use std::collections::BTreeMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

use models::blog_post::{self, PostStatus};
use models::product;

use crate::errors::ServiceError;

/// Admin dashboard counters.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub products: u64,
    pub published_products: u64,
    pub posts: u64,
    pub published_posts: u64,
    /// keyed by status name, every status present
    pub quotes_by_status: BTreeMap<String, u64>,
    pub unread_messages: u64,
}

pub async fn dashboard(db: &DatabaseConnection) -> Result<DashboardStats, ServiceError> {
    let products = product::Entity::find().count(db).await?;
    let published_products = product::Entity::find()
        .filter(product::Column::Published.eq(true))
        .count(db)
        .await?;
    let posts = blog_post::Entity::find().count(db).await?;
    let published_posts = blog_post::Entity::find()
        .filter(blog_post::Column::Status.eq(PostStatus::Published))
        .count(db)
        .await?;
    let quotes_by_status = super::quote_service::counts_by_status(db)
        .await?
        .into_iter()
        .map(|(s, n)| (s.as_str().to_string(), n))
        .collect();
    let unread_messages = super::contact_service::unread_count(db).await?;

    Ok(DashboardStats { products, published_products, posts, published_posts, quotes_by_status, unread_messages })
}
