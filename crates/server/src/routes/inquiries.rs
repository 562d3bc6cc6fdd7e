//! Quote requests and contact messages.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::{contact_message, quote};
use service::db::contact_service::{self, ContactInput};
use service::db::quote_service::{self, QuoteInput, QuotePatch, QuoteReceipt};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    pub unread: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReadInput {
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool { true }

fn pagination(page: Option<u32>, per_page: Option<u32>) -> Pagination {
    let mut opts = Pagination::default();
    if let Some(p) = page { opts.page = p; }
    if let Some(pp) = per_page { opts.per_page = pp; }
    opts
}

#[utoipa::path(post, path = "/api/quotes", tag = "inquiries", request_body = crate::openapi::QuoteRequest, responses((status = 201, description = "Quote received"), (status = 400, description = "Validation Error")))]
pub async fn submit_quote(State(state): State<ServerState>, ApiJson(input): ApiJson<QuoteInput>) -> Result<(StatusCode, Json<QuoteReceipt>), JsonApiError> {
    let receipt = quote_service::submit_quote(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(post, path = "/api/contact", tag = "inquiries", request_body = crate::openapi::ContactRequest, responses((status = 201, description = "Message received"), (status = 400, description = "Validation Error")))]
pub async fn submit_contact(State(state): State<ServerState>, ApiJson(input): ApiJson<ContactInput>) -> Result<(StatusCode, Json<serde_json::Value>), JsonApiError> {
    let m = contact_service::submit_message(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": m.id }))))
}

#[utoipa::path(get, path = "/api/admin/quotes", tag = "admin", params(QuoteQuery), responses((status = 200, description = "Paged quotes"), (status = 400, description = "Unknown status")))]
pub async fn list_quotes(State(state): State<ServerState>, ApiQuery(q): ApiQuery<QuoteQuery>) -> Result<Json<Page<quote::Model>>, JsonApiError> {
    let status = match q.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => Some(quote_service::parse_status(s)?),
        None => None,
    };
    Ok(Json(quote_service::list_quotes(&state.db, status, pagination(q.page, q.per_page)).await?))
}

pub async fn get_quote(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<quote::Model>, JsonApiError> {
    quote_service::get_quote(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("quote"))
}

#[utoipa::path(put, path = "/api/admin/quotes/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Quote ID")), request_body = crate::openapi::QuotePatchRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Unknown status"), (status = 404, description = "Not Found")))]
pub async fn update_quote(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<QuotePatch>,
) -> Result<Json<quote::Model>, JsonApiError> {
    Ok(Json(quote_service::update_quote(&state.db, id, patch).await?))
}

pub async fn delete_quote(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    if quote_service::delete_quote(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("quote"))
    }
}

pub async fn list_messages(State(state): State<ServerState>, ApiQuery(q): ApiQuery<MessageQuery>) -> Result<Json<Page<contact_message::Model>>, JsonApiError> {
    Ok(Json(contact_service::list_messages(&state.db, q.unread, pagination(q.page, q.per_page)).await?))
}

pub async fn mark_message(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ReadInput>,
) -> Result<Json<contact_message::Model>, JsonApiError> {
    Ok(Json(contact_service::mark_read(&state.db, id, input.read).await?))
}

pub async fn delete_message(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    if contact_service::delete_message(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("message"))
    }
}
