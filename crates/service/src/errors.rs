use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// True for errors caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::Validation(_)
            | ServiceError::NotFound(_)
            | ServiceError::Conflict(_)
            | ServiceError::TooLarge { .. }
            | ServiceError::UnsupportedMedia(_) => true,
            ServiceError::Model(models::errors::ModelError::Validation(_) | models::errors::ModelError::Conflict(_)) => true,
            _ => false,
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        match models::errors::ModelError::from(e) {
            models::errors::ModelError::Conflict(m) => ServiceError::Conflict(m),
            models::errors::ModelError::Validation(m) => ServiceError::Validation(m),
            models::errors::ModelError::Db(m) => ServiceError::Db(m),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self { ServiceError::Storage(e.to_string()) }
}
