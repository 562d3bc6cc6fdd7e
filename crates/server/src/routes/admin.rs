use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::db::stats_service::{self, DashboardStats};
use service::slug::{self, SlugKind};

use crate::errors::JsonApiError;
use crate::extract::ApiQuery;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlugCheckQuery {
    /// `product`, `post` or `category`
    #[param(value_type = String)]
    pub kind: SlugKind,
    pub slug: String,
    pub exclude_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SlugCheck {
    pub slug: String,
    pub available: bool,
}

#[utoipa::path(get, path = "/api/admin/stats", tag = "admin", responses((status = 200, description = "Dashboard counters")))]
pub async fn stats(State(state): State<ServerState>) -> Result<Json<DashboardStats>, JsonApiError> {
    Ok(Json(stats_service::dashboard(&state.db).await?))
}

/// Invalid slugs are reported as unavailable rather than rejected.
#[utoipa::path(get, path = "/api/slugs/check", tag = "admin", params(SlugCheckQuery), responses((status = 200, description = "Availability")))]
pub async fn check_slug(State(state): State<ServerState>, ApiQuery(q): ApiQuery<SlugCheckQuery>) -> Result<Json<SlugCheck>, JsonApiError> {
    let candidate = q.slug.trim().to_string();
    let available = if slug::validate_slug(&candidate).is_err() {
        false
    } else {
        !slug::is_taken(&state.db, q.kind, &candidate, q.exclude_id).await?
    };
    Ok(Json(SlugCheck { slug: candidate, available }))
}
