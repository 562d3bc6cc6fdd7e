use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::blog_post::{self, PostStatus};
use service::db::post_service::{self, PostFilter, PostInput, PostPatch, TagCount};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostQuery {
    /// `draft` or `published`; admin listing only
    pub status: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PostQuery {
    fn split(self, include_drafts: bool) -> Result<(PostFilter, Pagination), JsonApiError> {
        let status = match self.status.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(PostStatus::parse(s).map_err(|e| JsonApiError::bad_request(e.to_string()))?),
            None => None,
        };
        let mut opts = Pagination::default();
        if let Some(p) = self.page { opts.page = p; }
        if let Some(pp) = self.per_page { opts.per_page = pp; }
        Ok((PostFilter { status, tag: self.tag, q: self.q, include_drafts }, opts))
    }
}

#[utoipa::path(get, path = "/api/posts", tag = "blog", params(PostQuery), responses((status = 200, description = "Paged published posts")))]
pub async fn list_posts(State(state): State<ServerState>, ApiQuery(q): ApiQuery<PostQuery>) -> Result<Json<Page<blog_post::Model>>, JsonApiError> {
    let (filter, opts) = q.split(false)?;
    Ok(Json(post_service::list_posts(&state.db, &filter, opts, &state.media).await?))
}

#[utoipa::path(get, path = "/api/posts/tags", tag = "blog", responses((status = 200, description = "Tags of published posts with counts")))]
pub async fn list_tags(State(state): State<ServerState>) -> Result<Json<Vec<TagCount>>, JsonApiError> {
    Ok(Json(post_service::tag_counts(&state.db).await?))
}

#[utoipa::path(get, path = "/api/posts/{slug}", tag = "blog", params(("slug" = String, Path, description = "Post slug")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get_post(State(state): State<ServerState>, ApiPath(slug): ApiPath<String>) -> Result<Json<blog_post::Model>, JsonApiError> {
    post_service::get_published_by_slug(&state.db, &slug, &state.media)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("post"))
}

pub async fn admin_list_posts(State(state): State<ServerState>, ApiQuery(q): ApiQuery<PostQuery>) -> Result<Json<Page<blog_post::Model>>, JsonApiError> {
    let (filter, opts) = q.split(true)?;
    Ok(Json(post_service::list_posts(&state.db, &filter, opts, &state.media).await?))
}

pub async fn admin_get_post(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<blog_post::Model>, JsonApiError> {
    post_service::get_post(&state.db, id, &state.media)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("post"))
}

#[utoipa::path(post, path = "/api/admin/posts", tag = "admin", request_body = crate::openapi::PostRequest, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "Slug Conflict")))]
pub async fn create_post(State(state): State<ServerState>, ApiJson(input): ApiJson<PostInput>) -> Result<Json<blog_post::Model>, JsonApiError> {
    Ok(Json(post_service::create_post(&state.db, input, &state.media).await?))
}

pub async fn update_post(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<PostPatch>,
) -> Result<Json<blog_post::Model>, JsonApiError> {
    Ok(Json(post_service::update_post(&state.db, id, patch, &state.media).await?))
}

pub async fn delete_post(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    if post_service::delete_post(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("post"))
    }
}
