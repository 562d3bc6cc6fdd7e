//! Admin authentication: domain types, repository seam, and the service that
//! hashes passwords and issues/verifies JWTs.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
