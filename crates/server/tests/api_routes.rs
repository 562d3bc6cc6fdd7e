//! Router-level tests driven with `oneshot`; no database or network needed.
//! Handlers that would reach Postgres either fail validation first or hit a
//! disconnected pool, which must surface as a JSON 500.

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use server::routes;
use server::ServerState;
use models::product_category;
use service::auth::domain::CreateAdminInput;
use service::auth::repository::{mock::MockAuthRepository, AuthRepository};
use service::auth::{service::AuthConfig, AuthService};
use service::media::MediaUrls;
use service::storage::UploadStore;

const SECRET: &str = "router-test-secret-0123";
const EMAIL: &str = "admin@example.com";
const PASSWORD: &str = "Sup3rSecret";
const BOUNDARY: &str = "XTESTBOUNDARY";

fn test_state(upload_dir: &Path) -> ServerState {
    test_state_with_db(upload_dir, DatabaseConnection::Disconnected)
}

fn test_state_with_db(upload_dir: &Path, db: DatabaseConnection) -> ServerState {
    let repo: Arc<dyn AuthRepository> = Arc::new(MockAuthRepository::default());
    let media = MediaUrls::new("http://cdn.test");
    ServerState {
        db,
        auth: Arc::new(AuthService::new(repo, AuthConfig::new(SECRET, 1))),
        media: media.clone(),
        uploads: Arc::new(UploadStore::new(upload_dir, 1024, vec!["image/png".into()], media)),
        cookie_secure: false,
    }
}

async fn app_with_admin(upload_dir: &Path) -> Router {
    app_with_admin_on(upload_dir, DatabaseConnection::Disconnected).await
}

async fn app_with_admin_on(upload_dir: &Path, db: DatabaseConnection) -> Router {
    let state = test_state_with_db(upload_dir, db);
    state
        .auth
        .create_admin(CreateAdminInput { email: EMAIL.into(), name: "Admin".into(), password: PASSWORD.into() })
        .await
        .unwrap();
    routes::build_router(state, CorsLayer::very_permissive())
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn login_token(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/login", json!({"email": EMAIL, "password": PASSWORD})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["token"].as_str().unwrap().to_string()
}

fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/admin/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let tmp = tempfile::tempdir().unwrap();
    let app = routes::build_router(test_state(tmp.path()), CorsLayer::very_permissive());
    let resp = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn admin_routes_require_a_valid_token() {
    let tmp = tempfile::tempdir().unwrap();
    let app = routes::build_router(test_state(tmp.path()), CorsLayer::very_permissive());

    let resp = app.clone().oneshot(Request::get("/api/admin/stats").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "Unauthorized");

    let resp = app
        .clone()
        .oneshot(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(
            Request::get("/api/admin/quotes")
                .header(header::AUTHORIZATION, "Basic YWRtaW46eA==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_cookie_and_token_works_both_ways() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_admin(tmp.path()).await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/login", json!({"email": "ADMIN@example.com", "password": PASSWORD})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], EMAIL);
    let token = body["token"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["email"], EMAIL);

    let resp = app
        .clone()
        .oneshot(
            Request::get("/api/auth/me")
                .header(header::COOKIE, format!("auth_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/login", json!({"email": EMAIL, "password": "wrong-pass"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(Request::post("/api/auth/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cleared = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cleared.starts_with("auth_token=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert!(cleared.contains("HttpOnly"));
    assert!(cleared.contains("Path=/"));

    let resp = app
        .oneshot(
            Request::post("/api/auth/logout")
                .header(header::COOKIE, format!("auth_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cleared = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cleared.starts_with("auth_token=;"));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn admin_accounts_and_password_change() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_admin(tmp.path()).await;
    let token = login_token(&app).await;

    let mut req = json_request("POST", "/api/admin/users", json!({"email": "second@example.com", "name": "Second", "password": "short"}));
    req.headers_mut().insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::BAD_REQUEST);

    let mut req = json_request("POST", "/api/admin/users", json!({"email": "second@example.com", "name": "Second", "password": "LongEnough1"}));
    req.headers_mut().insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::OK);

    let mut req = json_request("PUT", "/api/admin/users/me/password", json!({"current_password": "nope-nope", "new_password": "NewPass123"}));
    req.headers_mut().insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::UNAUTHORIZED);

    let mut req = json_request("PUT", "/api/admin/users/me/password", json!({"current_password": PASSWORD, "new_password": "NewPass123"}));
    req.headers_mut().insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(json_request("POST", "/api/auth/login", json!({"email": EMAIL, "password": "NewPass123"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_store_and_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_admin(tmp.path()).await;
    let token = login_token(&app).await;

    let resp = app
        .clone()
        .oneshot(upload_request(&token, &[("flange.png", "image/png", b"\x89PNG-data"), ("gasket.png", "image/png", b"\x89PNG-more")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let files = body.as_array().unwrap();
    assert_eq!(files.len(), 2);
    let filename = files[0]["filename"].as_str().unwrap().to_string();
    assert_eq!(files[0]["original_name"], "flange.png");
    assert_eq!(files[0]["url"], format!("http://cdn.test/uploads/{filename}"));
    assert!(tmp.path().join(&filename).exists());

    let resp = app
        .clone()
        .oneshot(
            Request::get(format!("/uploads/{filename}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_SECURITY_POLICY], "sandbox");
    assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let delete = |name: String| {
        Request::delete(format!("/api/admin/uploads/{name}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(app.clone().oneshot(delete(filename.clone())).await.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(app.clone().oneshot(delete(filename)).await.unwrap().status(), StatusCode::NOT_FOUND);
    assert_eq!(app.oneshot(delete("a..b".into())).await.unwrap().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_rejects_bad_type_and_size() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_admin(tmp.path()).await;
    let token = login_token(&app).await;

    let resp = app
        .clone()
        .oneshot(upload_request(&token, &[("notes.txt", "text/plain", b"hello")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let big = vec![7u8; 2048];
    let resp = app
        .clone()
        .oneshot(upload_request(&token, &[("big.png", "image/png", &big)]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let resp = app.oneshot(upload_request(&token, &[])).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_forms_validate_before_storage() {
    let tmp = tempfile::tempdir().unwrap();
    let app = routes::build_router(test_state(tmp.path()), CorsLayer::very_permissive());

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/quotes",
            json!({"name": "Ana", "email": "ana@example.com", "message": "hi", "details": ["not", "an", "object"]}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Validation Error");

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/contact", json!({"name": "Lee", "email": "nope", "message": "hello"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let huge = "x".repeat(routes::JSON_BODY_LIMIT + 10);
    let resp = app
        .oneshot(json_request("POST", "/api/contact", json!({"name": "Lee", "email": "a@b.co", "message": huge})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn database_failures_surface_as_json_500() {
    let tmp = tempfile::tempdir().unwrap();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([
            DbErr::Custom("connection reset".into()),
            DbErr::Custom("connection reset".into()),
            DbErr::Custom("connection reset".into()),
            DbErr::Custom("connection reset".into()),
        ])
        .into_connection();
    let app = app_with_admin_on(tmp.path(), db).await;
    let token = login_token(&app).await;

    let resp = app
        .oneshot(
            Request::get("/api/admin/stats")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "Internal Error");
}

#[tokio::test]
async fn query_validation_and_slug_check_without_db() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_admin(tmp.path()).await;
    let token = login_token(&app).await;
    let get = |uri: &str| {
        Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let resp = app.clone().oneshot(get("/api/admin/quotes?status=lost")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.clone().oneshot(get("/api/admin/posts?status=archived")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.oneshot(get("/api/slugs/check?kind=product&slug=Not%20Valid")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"slug": "Not Valid", "available": false}));
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_admin(tmp.path()).await;
    let token = login_token(&app).await;

    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/quotes")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Validation Error");

    // wrong field types are a 400 too, not axum's 422
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/quotes", json!({"name": 5, "email": "a@b.co", "message": "x"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["detail"].is_string());

    let resp = app
        .clone()
        .oneshot(Request::post("/api/contact").body(Body::from(r#"{"name":"a"}"#)).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(resp).await["error"], "Unsupported Media Type");

    let resp = app
        .clone()
        .oneshot(Request::get("/api/products?per_page=lots").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Validation Error");

    let resp = app
        .oneshot(
            Request::get("/api/admin/categories/not-a-uuid")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Validation Error");
}

#[tokio::test]
async fn admin_reads_category_by_id() {
    let tmp = tempfile::tempdir().unwrap();
    let now = chrono::Utc::now().fixed_offset();
    let id = uuid::Uuid::new_v4();
    let category = product_category::Model {
        id,
        name: "Valves".into(),
        slug: "valves".into(),
        description: None,
        sort_order: 2,
        created_at: now,
        updated_at: now,
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![category], Vec::<product_category::Model>::new()])
        .into_connection();
    let app = app_with_admin_on(tmp.path(), db).await;
    let token = login_token(&app).await;
    let get = |uri: String| {
        Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let resp = app.clone().oneshot(get(format!("/api/admin/categories/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["slug"], "valves");
    assert_eq!(body["sort_order"], 2);

    let resp = app.oneshot(get(format!("/api/admin/categories/{}", uuid::Uuid::new_v4()))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
