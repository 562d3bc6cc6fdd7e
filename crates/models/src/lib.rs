//! Database entities for the CMS plus the column-level validation that
//! guards every insert.

pub mod errors;
pub mod db;
pub mod validation;
pub mod json;
pub mod admin_user;
pub mod product_category;
pub mod product;
pub mod blog_post;
pub mod quote;
pub mod contact_message;
