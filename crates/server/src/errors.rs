use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// JSON error body: `{"error": title, "detail": ...}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(detail.into()))
    }

    pub fn not_found(entity: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some(format!("{entity} not found")))
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.title, "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}

/// Extractor rejections keep 413/415 (and 5xx); anything else about the request is a 400.
fn rejected(status: StatusCode, body: String) -> JsonApiError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => JsonApiError::new(status, "Payload Too Large", Some(body)),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => JsonApiError::new(status, "Unsupported Media Type", Some(body)),
        s if s.is_server_error() => JsonApiError::new(s, "Internal Error", Some(body)),
        _ => JsonApiError::bad_request(body),
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self { rejected(r.status(), r.body_text()) }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self { rejected(r.status(), r.body_text()) }
}

impl From<QueryRejection> for JsonApiError {
    fn from(r: QueryRejection) -> Self { rejected(r.status(), r.body_text()) }
}

impl From<MultipartRejection> for JsonApiError {
    fn from(r: MultipartRejection) -> Self { rejected(r.status(), r.body_text()) }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let detail = Some(e.to_string());
        match e {
            ServiceError::Validation(_) | ServiceError::Model(ModelError::Validation(_)) => {
                Self::new(StatusCode::BAD_REQUEST, "Validation Error", detail)
            }
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            ServiceError::Conflict(_) | ServiceError::Model(ModelError::Conflict(_)) => {
                Self::new(StatusCode::CONFLICT, "Conflict", detail)
            }
            ServiceError::TooLarge { .. } => Self::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large", detail),
            ServiceError::UnsupportedMedia(_) => {
                Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type", detail)
            }
            ServiceError::Storage(_) | ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_)) => {
                error!(err = %e, "service failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", detail)
            }
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let detail = Some(e.to_string());
        match e {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", detail),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "Conflict", detail),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            AuthError::Unauthorized | AuthError::InvalidToken => Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                error!(err = %e, code = e.code(), "auth failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", detail)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("bootstrap admin failed: {0}")]
    Bootstrap(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Model(ModelError::Validation("x".into())), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Model(ModelError::Conflict("slug".into())), StatusCode::CONFLICT),
            (ServiceError::TooLarge { size: 2, limit: 1 }, StatusCode::PAYLOAD_TOO_LARGE),
            (ServiceError::UnsupportedMedia("text/x".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (ServiceError::Db("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn bad_credentials_and_bad_tokens_are_401() {
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::InvalidToken).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::Conflict).status, StatusCode::CONFLICT);
    }
}
