use thiserror::Error;

use crate::domain::cart::CartError;
use crate::repository::errors::RepositoryError;
use crate::services::saga::SagaError;
use crate::storage::StorageError;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod editor;
pub mod products;
pub mod saga;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by the service layer. Routes turn each variant into one
/// notification or HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    /// Invalid user input; the message is shown as-is.
    #[error("{0}")]
    Form(String),
    /// The write clashes with existing data; the message is shown as-is.
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Saga(#[from] SagaError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Repository(other),
        }
    }
}
