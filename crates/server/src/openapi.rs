use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct CreateAdminRequest { pub email: String, pub name: String, pub password: String }

#[derive(ToSchema)]
pub struct ChangePasswordRequest { pub current_password: String, pub new_password: String }

#[derive(ToSchema)]
pub struct CategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(ToSchema)]
pub struct ProductImageDoc { pub url: String, pub alt: Option<String>, pub is_cover: Option<bool> }

#[derive(ToSchema)]
pub struct SpecEntryDoc { pub label: String, pub value: String }

#[derive(ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<ProductImageDoc>>,
    pub specifications: Option<Vec<SpecEntryDoc>>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(ToSchema)]
pub struct CoverRequest { pub url: String }

#[derive(ToSchema)]
pub struct PostRequest {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    /// HTML, sanitized on save
    pub content: String,
    pub cover_image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: String,
    /// `draft` (default) or `published`
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub quantity: Option<i32>,
    pub message: String,
    /// free-form wizard answers, at most 50 keys
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
}

#[derive(ToSchema)]
pub struct QuotePatchRequest {
    /// pending | contacted | quoted | closed
    pub status: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(format = Binary)]
    pub file: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::create_admin,
        crate::routes::auth::change_password,
        crate::routes::catalog::list_categories,
        crate::routes::catalog::get_category,
        crate::routes::catalog::create_category,
        crate::routes::catalog::list_products,
        crate::routes::catalog::get_product,
        crate::routes::catalog::related_products,
        crate::routes::catalog::create_product,
        crate::routes::catalog::set_cover,
        crate::routes::posts::list_posts,
        crate::routes::posts::list_tags,
        crate::routes::posts::get_post,
        crate::routes::posts::create_post,
        crate::routes::inquiries::submit_quote,
        crate::routes::inquiries::submit_contact,
        crate::routes::inquiries::list_quotes,
        crate::routes::inquiries::update_quote,
        crate::routes::uploads::upload,
        crate::routes::uploads::delete_upload,
        crate::routes::admin::stats,
        crate::routes::admin::check_slug,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            CreateAdminRequest,
            ChangePasswordRequest,
            CategoryRequest,
            ProductImageDoc,
            SpecEntryDoc,
            ProductRequest,
            CoverRequest,
            PostRequest,
            QuoteRequest,
            QuotePatchRequest,
            ContactRequest,
            UploadForm,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "catalog"),
        (name = "blog"),
        (name = "inquiries"),
        (name = "admin")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_public_and_admin_paths() {
        let doc = ApiDoc::openapi();
        for p in ["/health", "/api/products", "/api/quotes", "/api/admin/uploads", "/api/slugs/check"] {
            assert!(doc.paths.paths.contains_key(p), "missing {p}");
        }
    }
}
