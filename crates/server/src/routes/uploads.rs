use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use service::storage::StoredUpload;

use crate::errors::JsonApiError;
use crate::extract::ApiPath;
use crate::routes::auth::ServerState;

pub const FILE_FIELD: &str = "file";

#[utoipa::path(post, path = "/api/admin/uploads", tag = "admin", request_body(content = crate::openapi::UploadForm, content_type = "multipart/form-data", description = "one or more `file` parts"), responses((status = 200, description = "Stored files"), (status = 413, description = "Too Large"), (status = 415, description = "Unsupported Media Type")))]
pub async fn upload(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<StoredUpload>>, JsonApiError> {
    let mut multipart = multipart?;
    let mut stored = Vec::new();
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            warn!(err = %e, "multipart read failed");
            JsonApiError::new(e.status(), "Upload Failed", Some(e.body_text()))
        })?;
        let Some(field) = field else { break };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| JsonApiError::new(e.status(), "Upload Failed", Some(e.body_text())))?;
        stored.push(state.uploads.save(original_name.as_deref(), content_type.as_deref(), &bytes).await?);
    }
    if stored.is_empty() {
        return Err(JsonApiError::bad_request(format!("no '{FILE_FIELD}' part in request")));
    }
    info!(count = stored.len(), "uploads_stored");
    Ok(Json(stored))
}

#[utoipa::path(delete, path = "/api/admin/uploads/{filename}", tag = "admin", params(("filename" = String, Path, description = "Stored file name")), responses((status = 204, description = "Deleted"), (status = 400, description = "Invalid name"), (status = 404, description = "Not Found")))]
pub async fn delete_upload(State(state): State<ServerState>, ApiPath(filename): ApiPath<String>) -> Result<StatusCode, JsonApiError> {
    state.uploads.delete(&filename).await?;
    Ok(StatusCode::NO_CONTENT)
}
