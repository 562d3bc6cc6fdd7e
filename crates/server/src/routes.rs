pub mod auth;
pub mod admin;
pub mod catalog;
pub mod posts;
pub mod inquiries;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use auth::ServerState;

/// JSON bodies outside the upload route.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public site API, auth, admin API, uploads and docs
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let upload_limit = state.uploads.max_bytes() + JSON_BODY_LIMIT;
    let upload_dir = state.uploads.dir().to_path_buf();

    // Public site API
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/categories/:slug", get(catalog::get_category))
        .route("/api/products", get(catalog::list_products))
        .route("/api/products/:slug", get(catalog::get_product))
        .route("/api/products/:slug/related", get(catalog::related_products))
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/tags", get(posts::list_tags))
        .route("/api/posts/:slug", get(posts::get_post))
        .route("/api/quotes", post(inquiries::submit_quote))
        .route("/api/contact", post(inquiries::submit_contact))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout));

    // 上传接口单独放宽 body 限制
    let upload_routes: Router<ServerState> = Router::new()
        .route("/api/admin/uploads", post(uploads::upload))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit));

    // Stored files are served inert: no script execution, no sniffing
    let stored_files: Router = Router::new()
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(SetResponseHeaderLayer::overriding(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static("sandbox")))
        .layer(SetResponseHeaderLayer::overriding(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")));

    // Everything below requires a valid admin token
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/slugs/check", get(admin::check_slug))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/users", post(auth::create_admin))
        .route("/api/admin/users/me/password", put(auth::change_password))
        .route("/api/admin/categories", get(catalog::admin_list_categories).post(catalog::create_category))
        .route(
            "/api/admin/categories/:id",
            get(catalog::admin_get_category).put(catalog::update_category).delete(catalog::delete_category),
        )
        .route("/api/admin/products", get(catalog::admin_list_products).post(catalog::create_product))
        .route(
            "/api/admin/products/:id",
            get(catalog::admin_get_product).put(catalog::update_product).delete(catalog::delete_product),
        )
        .route("/api/admin/products/:id/cover", put(catalog::set_cover))
        .route("/api/admin/posts", get(posts::admin_list_posts).post(posts::create_post))
        .route(
            "/api/admin/posts/:id",
            get(posts::admin_get_post).put(posts::update_post).delete(posts::delete_post),
        )
        .route("/api/admin/quotes", get(inquiries::list_quotes))
        .route(
            "/api/admin/quotes/:id",
            get(inquiries::get_quote).put(inquiries::update_quote).delete(inquiries::delete_quote),
        )
        .route("/api/admin/messages", get(inquiries::list_messages))
        .route("/api/admin/messages/:id", delete(inquiries::delete_message))
        .route("/api/admin/messages/:id/read", put(inquiries::mark_message))
        .route("/api/admin/uploads/:filename", delete(uploads::delete_upload))
        .merge(upload_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    public
        .merge(protected)
        .with_state(state)
        .merge(stored_files)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
