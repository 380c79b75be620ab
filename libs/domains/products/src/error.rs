use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_ai::AiError;
use thiserror::Error;

use crate::models::EmbeddingField;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    MissingField(String),

    #[error("Invalid embedding model: {0}")]
    InvalidEmbeddingModel(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{field} vector has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        field: EmbeddingField,
        expected: usize,
        actual: usize,
    },

    #[error("Catalog I/O error: {0}")]
    CatalogIo(#[from] std::io::Error),

    #[error("Catalog format error: {0}")]
    CatalogFormat(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Ai(#[from] AiError),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::MissingField(msg) => AppError::MissingField(msg),
            ProductError::InvalidEmbeddingModel(model) => AppError::BadRequest(format!(
                "Invalid embedding model '{}'; expected text-embedding-ada-002 or text-embedding-3-large",
                model
            )),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            err @ ProductError::DimensionMismatch { .. } => AppError::BadGateway(err.to_string()),
            ProductError::CatalogIo(e) => AppError::Io(e),
            ProductError::CatalogFormat(e) => {
                AppError::InternalServerError(format!("Catalog is not valid JSON: {}", e))
            }
            ProductError::Database(msg) => AppError::InternalServerError(msg),
            ProductError::Ai(e) => e.into(),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ProductError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProductError::Validation(err.to_string())
    }
}
