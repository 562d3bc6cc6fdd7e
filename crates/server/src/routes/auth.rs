use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{info, warn};

use service::auth::domain::{AuthUser, ChangePasswordInput, Claims, CreateAdminInput, LoginInput};
use service::auth::repository::AuthRepository;
use service::auth::AuthService;
use service::media::MediaUrls;
use service::storage::UploadStore;

use crate::errors::JsonApiError;
use crate::extract::ApiJson;

pub const AUTH_COOKIE: &str = "auth_token";

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    pub media: MediaUrls,
    pub uploads: Arc<UploadStore>,
    pub cookie_secure: bool,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: i64,
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let jar = jar.add(session_cookie(session.token.clone(), state.cookie_secure));
    Ok((jar, Json(LoginOutput { user: session.user, token: session.token, expires_at: session.expires_at })))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(State(state): State<ServerState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    // 无论请求是否带 cookie，都下发一个过期的 auth_token
    let mut cookie = session_cookie(String::new(), state.cookie_secure);
    cookie.make_removal();
    (jar.add(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, description = "Current admin"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, Extension(claims): Extension<Claims>) -> Result<Json<AuthUser>, JsonApiError> {
    Ok(Json(state.auth.current_user(&claims).await?))
}

#[utoipa::path(post, path = "/api/admin/users", tag = "admin", request_body = crate::openapi::CreateAdminRequest, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "Conflict")))]
pub async fn create_admin(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    ApiJson(input): ApiJson<CreateAdminInput>,
) -> Result<Json<AuthUser>, JsonApiError> {
    let user = state.auth.create_admin(input).await?;
    info!(by = %claims.sub, created = %user.email, "admin_user_added");
    Ok(Json(user))
}

#[utoipa::path(put, path = "/api/admin/users/me/password", tag = "admin", request_body = crate::openapi::ChangePasswordRequest, responses((status = 204, description = "Changed"), (status = 401, description = "Wrong current password")))]
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    ApiJson(input): ApiJson<ChangePasswordInput>,
) -> Result<StatusCode, JsonApiError> {
    state.auth.change_password(claims.uid, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Token from `Authorization: Bearer ..`, falling back to the `auth_token` cookie.
fn extract_token(req: &Request) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let h = h.to_str().map_err(|_| JsonApiError::unauthorized("malformed Authorization header"))?;
        let token = h
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| JsonApiError::unauthorized("expected Bearer token"))?;
        return Ok(Some(token.to_string()));
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// 管理端中间件：校验 Bearer 或 Cookie 中的 token，通过后把 claims 放入请求扩展
pub async fn require_admin(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = extract_token(&req)? else {
        warn!(%path, "missing Authorization header and auth_token cookie");
        return Err(JsonApiError::unauthorized("authentication required"));
    };
    let claims = state.auth.verify_token(&token).map_err(|e| {
        warn!(%path, err = %e, "token validation failed");
        JsonApiError::from(e)
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
