//! File storage for the service layer.
//!
//! Uploaded media lives on local disk and is served back under `/uploads/`.

pub mod uploads;

pub use uploads::{StoredUpload, UploadStore};
