//! Service layer providing the CMS business operations on top of models.
//! - Separates business logic (slugs, gallery rules, publishing) from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Returns `ServiceError` so the HTTP layer can map failures to status codes.

pub mod errors;
pub mod auth;
pub mod slug;
pub mod media;
pub mod content;
pub mod db;
pub mod storage;
#[cfg(test)]
pub mod test_support;
