use std::collections::HashMap;

use chrono::Utc;
use common::pagination::{Page, Pagination};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::json::{ProductImage, ProductImages, SpecEntry, Specifications, Tags};
use models::{product, product_category, validation};

use crate::errors::ServiceError;
use crate::media::{self, MediaUrls};
use crate::slug::{self, SlugKind};

pub const DEFAULT_RELATED: u64 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub specifications: Vec<SpecEntry>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Partial update; `null` clears nullable fields, missing fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub summary: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub category_id: Option<Option<Uuid>>,
    pub images: Option<Vec<ProductImage>>,
    pub specifications: Option<Vec<SpecEntry>>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category slug
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub include_unpublished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&product_category::Model> for CategoryRef {
    fn from(c: &product_category::Model) -> Self {
        Self { id: c.id, name: c.name.clone(), slug: c.slug.clone() }
    }
}

/// Product as returned by the API: public image URLs, cover resolved, category embedded.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: product::Model,
    pub cover_image: Option<String>,
    pub category: Option<CategoryRef>,
}

impl ProductView {
    pub fn build(mut product: product::Model, category: Option<CategoryRef>, urls: &MediaUrls) -> Self {
        urls.gallery_to_public(&mut product.images.0);
        let cover_image = media::cover_of(&product.images.0).map(|i| i.url.clone());
        Self { product, cover_image, category }
    }
}

fn optional_text(field: &str, v: Option<&str>, max: usize) -> Result<Option<String>, ServiceError> {
    Ok(validation::optional_text(field, v, max)?)
}

fn prepare_gallery(images: Vec<ProductImage>, urls: &MediaUrls) -> ProductImages {
    let mut images = images;
    urls.gallery_to_stored(&mut images);
    ProductImages(media::normalize_gallery(images))
}

fn prepare_specs(specs: Vec<SpecEntry>) -> Result<Specifications, ServiceError> {
    let mut out = Vec::with_capacity(specs.len());
    for s in specs {
        let label = s.label.trim().to_string();
        let value = s.value.trim().to_string();
        if label.is_empty() && value.is_empty() {
            continue;
        }
        if label.is_empty() {
            return Err(ServiceError::Validation("specification label required".into()));
        }
        out.push(SpecEntry { label, value });
    }
    Ok(Specifications(out))
}

async fn ensure_category(db: &DatabaseConnection, id: Option<Uuid>) -> Result<Option<product_category::Model>, ServiceError> {
    match id {
        None => Ok(None),
        Some(id) => product_category::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Some)
            .ok_or_else(|| ServiceError::Validation(format!("category {id} does not exist"))),
    }
}

async fn category_map(db: &DatabaseConnection, products: &[product::Model]) -> Result<HashMap<Uuid, CategoryRef>, ServiceError> {
    let ids: Vec<Uuid> = products.iter().filter_map(|p| p.category_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let cats = product_category::Entity::find()
        .filter(product_category::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(cats.iter().map(|c| (c.id, CategoryRef::from(c))).collect())
}

async fn into_views(db: &DatabaseConnection, products: Vec<product::Model>, urls: &MediaUrls) -> Result<Vec<ProductView>, ServiceError> {
    let cats = category_map(db, &products).await?;
    Ok(products
        .into_iter()
        .map(|p| {
            let cat = p.category_id.and_then(|id| cats.get(&id).cloned());
            ProductView::build(p, cat, urls)
        })
        .collect())
}

/// List products matching `filter`, ordered by `sort_order` then newest first.
pub async fn list_products(
    db: &DatabaseConnection,
    filter: &ProductFilter,
    opts: Pagination,
    urls: &MediaUrls,
) -> Result<Page<ProductView>, ServiceError> {
    let mut cond = Condition::all();
    if !filter.include_unpublished {
        cond = cond.add(product::Column::Published.eq(true));
    }
    if let Some(cat_slug) = filter.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        match super::category_service::get_category_by_slug(db, cat_slug).await? {
            Some(c) => cond = cond.add(product::Column::CategoryId.eq(c.id)),
            None => return Ok(Page::new(Vec::new(), 0, opts)),
        }
    }
    if let Some(f) = filter.featured {
        cond = cond.add(product::Column::Featured.eq(f));
    }
    if let Some(tag) = filter.tag.as_deref().filter(|t| !t.trim().is_empty()) {
        cond = cond.add(super::jsonb_has_tag("tags", tag));
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        cond = cond.add(super::ilike_any(&["name", "summary"], q));
    }

    let (page_idx, per_page) = opts.normalize();
    let paginator = product::Entity::find()
        .filter(cond)
        .order_by_asc(product::Column::SortOrder)
        .order_by_desc(product::Column::CreatedAt)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page_idx).await?;
    let items = into_views(db, rows, urls).await?;
    Ok(Page::new(items, total, opts))
}

pub async fn get_product(db: &DatabaseConnection, id: Uuid, urls: &MediaUrls) -> Result<Option<ProductView>, ServiceError> {
    let Some(p) = product::Entity::find_by_id(id).one(db).await? else { return Ok(None) };
    Ok(into_views(db, vec![p], urls).await?.pop())
}

/// Public lookup by slug; unpublished products are invisible.
pub async fn get_published_by_slug(db: &DatabaseConnection, slug: &str, urls: &MediaUrls) -> Result<Option<ProductView>, ServiceError> {
    let found = product::Entity::find()
        .filter(product::Column::Slug.eq(slug))
        .filter(product::Column::Published.eq(true))
        .one(db)
        .await?;
    let Some(p) = found else { return Ok(None) };
    Ok(into_views(db, vec![p], urls).await?.pop())
}

/// Other published products in the same category as `slug`.
pub async fn related_products(db: &DatabaseConnection, slug: &str, limit: u64, urls: &MediaUrls) -> Result<Vec<ProductView>, ServiceError> {
    let Some(p) = product::Entity::find()
        .filter(product::Column::Slug.eq(slug))
        .filter(product::Column::Published.eq(true))
        .one(db)
        .await?
    else {
        return Err(ServiceError::not_found("product"));
    };
    let Some(cat) = p.category_id else { return Ok(Vec::new()) };
    let rows = product::Entity::find()
        .filter(product::Column::CategoryId.eq(cat))
        .filter(product::Column::Published.eq(true))
        .filter(product::Column::Id.ne(p.id))
        .order_by_asc(product::Column::SortOrder)
        .order_by_desc(product::Column::CreatedAt)
        .limit(limit.clamp(1, 20))
        .all(db)
        .await?;
    into_views(db, rows, urls).await
}

#[instrument(skip(db, input, urls), fields(name = %input.name))]
pub async fn create_product(db: &DatabaseConnection, input: ProductInput, urls: &MediaUrls) -> Result<ProductView, ServiceError> {
    let name = product::validate_name(&input.name)?;
    let category = ensure_category(db, input.category_id).await?;
    let slug = slug::resolve(db, SlugKind::Product, input.slug.as_deref(), &name, None).await?;

    let created = product::create(db, product::NewProduct {
        name,
        slug,
        summary: optional_text("summary", input.summary.as_deref(), 500)?,
        description: optional_text("description", input.description.as_deref(), 50_000)?,
        category_id: input.category_id,
        images: prepare_gallery(input.images, urls),
        specifications: prepare_specs(input.specifications)?,
        tags: Tags::normalized(&input.tags),
        featured: input.featured,
        published: input.published,
        sort_order: input.sort_order,
    })
    .await?;
    info!(id = %created.id, slug = %created.slug, "product_created");
    Ok(ProductView::build(created, category.as_ref().map(CategoryRef::from), urls))
}

#[instrument(skip(db, patch, urls))]
pub async fn update_product(db: &DatabaseConnection, id: Uuid, patch: ProductPatch, urls: &MediaUrls) -> Result<ProductView, ServiceError> {
    let existing = product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))?;
    let mut am: product::ActiveModel = existing.clone().into();

    let name = match patch.name.as_deref() {
        Some(n) => {
            let n = product::validate_name(n)?;
            am.name = Set(n.clone());
            n
        }
        None => existing.name.clone(),
    };
    if let Some(s) = patch.slug.as_deref() {
        let s = s.trim();
        if s != existing.slug {
            let explicit = if s.is_empty() { None } else { Some(s) };
            am.slug = Set(slug::resolve(db, SlugKind::Product, explicit, &name, Some(id)).await?);
        }
    }
    if let Some(summary) = patch.summary {
        am.summary = Set(optional_text("summary", summary.as_deref(), 500)?);
    }
    if let Some(desc) = patch.description {
        am.description = Set(optional_text("description", desc.as_deref(), 50_000)?);
    }
    if let Some(cat) = patch.category_id {
        ensure_category(db, cat).await?;
        am.category_id = Set(cat);
    }
    if let Some(images) = patch.images {
        am.images = Set(prepare_gallery(images, urls));
    }
    if let Some(specs) = patch.specifications {
        am.specifications = Set(prepare_specs(specs)?);
    }
    if let Some(tags) = patch.tags {
        am.tags = Set(Tags::normalized(&tags));
    }
    if let Some(f) = patch.featured {
        am.featured = Set(f);
    }
    if let Some(p) = patch.published {
        am.published = Set(p);
    }
    if let Some(o) = patch.sort_order {
        am.sort_order = Set(o);
    }
    am.updated_at = Set(Utc::now().into());

    let updated = am.update(db).await?;
    info!(id = %updated.id, "product_updated");
    Ok(into_views(db, vec![updated], urls).await?.remove(0))
}

/// Flag the gallery image with `url` as cover.
pub async fn set_product_cover(db: &DatabaseConnection, id: Uuid, url: &str, urls: &MediaUrls) -> Result<ProductView, ServiceError> {
    let existing = product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))?;
    let mut images = existing.images.clone();
    media::set_cover(&mut images, &urls.to_stored(url))?;

    let mut am: product::ActiveModel = existing.into();
    am.images = Set(images);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(id = %updated.id, cover = %url, "product_cover_set");
    Ok(into_views(db, vec![updated], urls).await?.remove(0))
}

/// Delete a product row. Uploaded files stay on disk.
pub async fn delete_product(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = product::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected > 0 {
        info!(id = %id, "product_deleted");
    }
    Ok(res.rows_affected > 0)
}
