//! Product categories and products, public and admin handlers.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::product_category;
use service::db::category_service::{self, CategoryInput, CategoryPatch, CategoryView};
use service::db::product_service::{self, ProductFilter, ProductInput, ProductPatch, ProductView, DEFAULT_RELATED};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// category slug
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductQuery {
    fn split(self, include_unpublished: bool) -> (ProductFilter, Pagination) {
        let mut opts = Pagination::default();
        if let Some(p) = self.page { opts.page = p; }
        if let Some(pp) = self.per_page { opts.per_page = pp; }
        let filter = ProductFilter {
            category: self.category,
            featured: self.featured,
            tag: self.tag,
            q: self.q,
            include_unpublished,
        };
        (filter, opts)
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RelatedQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CoverInput {
    pub url: String,
}

// ---- categories ----

#[utoipa::path(get, path = "/api/categories", tag = "catalog", responses((status = 200, description = "Categories with product counts")))]
pub async fn list_categories(State(state): State<ServerState>) -> Result<Json<Vec<CategoryView>>, JsonApiError> {
    Ok(Json(category_service::list_categories(&state.db, true).await?))
}

#[utoipa::path(get, path = "/api/categories/{slug}", tag = "catalog", params(("slug" = String, Path, description = "Category slug")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get_category(State(state): State<ServerState>, ApiPath(slug): ApiPath<String>) -> Result<Json<product_category::Model>, JsonApiError> {
    category_service::get_category_by_slug(&state.db, &slug)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("category"))
}

pub async fn admin_get_category(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<product_category::Model>, JsonApiError> {
    category_service::get_category(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("category"))
}

pub async fn admin_list_categories(State(state): State<ServerState>) -> Result<Json<Vec<CategoryView>>, JsonApiError> {
    Ok(Json(category_service::list_categories(&state.db, false).await?))
}

#[utoipa::path(post, path = "/api/admin/categories", tag = "admin", request_body = crate::openapi::CategoryRequest, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "Slug Conflict")))]
pub async fn create_category(State(state): State<ServerState>, ApiJson(input): ApiJson<CategoryInput>) -> Result<Json<product_category::Model>, JsonApiError> {
    Ok(Json(category_service::create_category(&state.db, input).await?))
}

pub async fn update_category(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<Json<product_category::Model>, JsonApiError> {
    Ok(Json(category_service::update_category(&state.db, id, patch).await?))
}

pub async fn delete_category(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    if category_service::delete_category(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("category"))
    }
}

// ---- products ----

#[utoipa::path(get, path = "/api/products", tag = "catalog", params(ProductQuery), responses((status = 200, description = "Paged published products")))]
pub async fn list_products(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ProductQuery>) -> Result<Json<Page<ProductView>>, JsonApiError> {
    let (filter, opts) = q.split(false);
    let page = product_service::list_products(&state.db, &filter, opts, &state.media).await?;
    debug!(total = page.total, "list products");
    Ok(Json(page))
}

#[utoipa::path(get, path = "/api/products/{slug}", tag = "catalog", params(("slug" = String, Path, description = "Product slug")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get_product(State(state): State<ServerState>, ApiPath(slug): ApiPath<String>) -> Result<Json<ProductView>, JsonApiError> {
    product_service::get_published_by_slug(&state.db, &slug, &state.media)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("product"))
}

#[utoipa::path(get, path = "/api/products/{slug}/related", tag = "catalog", params(("slug" = String, Path, description = "Product slug"), RelatedQuery), responses((status = 200, description = "Related products"), (status = 404, description = "Not Found")))]
pub async fn related_products(
    State(state): State<ServerState>,
    ApiPath(slug): ApiPath<String>,
    ApiQuery(q): ApiQuery<RelatedQuery>,
) -> Result<Json<Vec<ProductView>>, JsonApiError> {
    let limit = q.limit.unwrap_or(DEFAULT_RELATED);
    Ok(Json(product_service::related_products(&state.db, &slug, limit, &state.media).await?))
}

pub async fn admin_list_products(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ProductQuery>) -> Result<Json<Page<ProductView>>, JsonApiError> {
    let (filter, opts) = q.split(true);
    Ok(Json(product_service::list_products(&state.db, &filter, opts, &state.media).await?))
}

pub async fn admin_get_product(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<ProductView>, JsonApiError> {
    product_service::get_product(&state.db, id, &state.media)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("product"))
}

#[utoipa::path(post, path = "/api/admin/products", tag = "admin", request_body = crate::openapi::ProductRequest, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "Slug Conflict")))]
pub async fn create_product(State(state): State<ServerState>, ApiJson(input): ApiJson<ProductInput>) -> Result<Json<ProductView>, JsonApiError> {
    Ok(Json(product_service::create_product(&state.db, input, &state.media).await?))
}

pub async fn update_product(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<ProductView>, JsonApiError> {
    Ok(Json(product_service::update_product(&state.db, id, patch, &state.media).await?))
}

#[utoipa::path(put, path = "/api/admin/products/{id}/cover", tag = "admin", params(("id" = Uuid, Path, description = "Product ID")), request_body = crate::openapi::CoverRequest, responses((status = 200, description = "Cover set"), (status = 404, description = "Product or image not found")))]
pub async fn set_cover(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CoverInput>,
) -> Result<Json<ProductView>, JsonApiError> {
    Ok(Json(product_service::set_product_cover(&state.db, id, &input.url, &state.media).await?))
}

pub async fn delete_product(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    if product_service::delete_product(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("product"))
    }
}
