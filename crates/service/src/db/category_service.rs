use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{product, product_category, validation};

use crate::errors::ServiceError;
use crate::slug::{self, SlugKind};

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: product_category::Model,
    pub product_count: u64,
}

/// Product counts per category id; `published_only` restricts to visible products.
async fn product_counts(db: &DatabaseConnection, published_only: bool) -> Result<HashMap<Uuid, u64>, ServiceError> {
    let mut q = product::Entity::find()
        .select_only()
        .column(product::Column::CategoryId)
        .column_as(product::Column::Id.count(), "count")
        .filter(product::Column::CategoryId.is_not_null())
        .group_by(product::Column::CategoryId);
    if published_only {
        q = q.filter(product::Column::Published.eq(true));
    }
    let rows: Vec<(Option<Uuid>, i64)> = q.into_tuple().all(db).await?;
    Ok(rows
        .into_iter()
        .filter_map(|(id, n)| id.map(|id| (id, n.max(0) as u64)))
        .collect())
}

/// List categories in display order with product counts.
pub async fn list_categories(db: &DatabaseConnection, published_only: bool) -> Result<Vec<CategoryView>, ServiceError> {
    let cats = product_category::Entity::find()
        .order_by_asc(product_category::Column::SortOrder)
        .order_by_asc(product_category::Column::Name)
        .all(db)
        .await?;
    let counts = product_counts(db, published_only).await?;
    Ok(cats
        .into_iter()
        .map(|c| {
            let product_count = counts.get(&c.id).copied().unwrap_or(0);
            CategoryView { category: c, product_count }
        })
        .collect())
}

pub async fn get_category(db: &DatabaseConnection, id: Uuid) -> Result<Option<product_category::Model>, ServiceError> {
    Ok(product_category::Entity::find_by_id(id).one(db).await?)
}

pub async fn get_category_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<product_category::Model>, ServiceError> {
    Ok(product_category::Entity::find()
        .filter(product_category::Column::Slug.eq(slug))
        .one(db)
        .await?)
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_category(db: &DatabaseConnection, input: CategoryInput) -> Result<product_category::Model, ServiceError> {
    let name = product_category::validate_name(&input.name)?;
    let slug = slug::resolve(db, SlugKind::Category, input.slug.as_deref(), &name, None).await?;
    let created = product_category::create(db, &name, slug, input.description.as_deref(), input.sort_order).await?;
    info!(id = %created.id, slug = %created.slug, "category_created");
    Ok(created)
}

#[instrument(skip(db, patch))]
pub async fn update_category(db: &DatabaseConnection, id: Uuid, patch: CategoryPatch) -> Result<product_category::Model, ServiceError> {
    let existing = get_category(db, id).await?.ok_or_else(|| ServiceError::not_found("category"))?;
    let mut am: product_category::ActiveModel = existing.clone().into();

    if let Some(name) = patch.name.as_deref() {
        am.name = Set(product_category::validate_name(name)?);
    }
    if let Some(s) = patch.slug.as_deref() {
        let s = s.trim();
        if s != existing.slug {
            // blank slug means "derive again from the (new) name"
            let title = patch.name.as_deref().unwrap_or(&existing.name);
            let explicit = if s.is_empty() { None } else { Some(s) };
            am.slug = Set(slug::resolve(db, SlugKind::Category, explicit, title, Some(id)).await?);
        }
    }
    if let Some(desc) = patch.description {
        am.description = Set(validation::optional_text("description", desc.as_deref(), 2000)?);
    }
    if let Some(order) = patch.sort_order {
        am.sort_order = Set(order);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(id = %updated.id, "category_updated");
    Ok(updated)
}

/// Delete a category; its products are detached by the FK (`ON DELETE SET NULL`).
pub async fn delete_category(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = product_category::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected > 0 {
        info!(id = %id, "category_deleted");
    }
    Ok(res.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn category_crud_service() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let name = format!("Castings {}", Uuid::new_v4().simple());
        let c = create_category(&db, CategoryInput { name: name.clone(), slug: None, description: None, sort_order: 3 }).await?;
        assert_eq!(c.slug, slug::slugify(&name));

        // same name again gets a suffixed slug
        let c2 = create_category(&db, CategoryInput { name: name.clone(), slug: None, description: None, sort_order: 0 }).await?;
        assert_eq!(c2.slug, format!("{}-2", c.slug));

        // explicit duplicate slug is a conflict
        let dup = create_category(&db, CategoryInput { name: "x".into(), slug: Some(c.slug.clone()), description: None, sort_order: 0 }).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let updated = update_category(&db, c.id, CategoryPatch { description: Some(Some("Iron".into())), ..Default::default() }).await?;
        assert_eq!(updated.description.as_deref(), Some("Iron"));

        let listed = list_categories(&db, false).await?;
        assert!(listed.iter().any(|v| v.category.id == c.id && v.product_count == 0));

        assert!(delete_category(&db, c.id).await?);
        assert!(delete_category(&db, c2.id).await?);
        assert!(!delete_category(&db, c.id).await?);
        Ok(())
    }
}
