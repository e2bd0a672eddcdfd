pub mod admin_service;
pub mod catalog_service;

pub use admin_service::AdminService;
pub use catalog_service::{CatalogService, ListParams, Page, Pagination, StatsOverview};

use thiserror::Error;

use crate::auth::AuthError;
use crate::models::Invalid;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{}", .0.message)]
    Invalid(Invalid),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<Invalid> for ServiceError {
    fn from(invalid: Invalid) -> Self {
        ServiceError::Invalid(invalid)
    }
}

/// Single-field validation failure
pub(crate) fn invalid(message: impl Into<String>) -> ServiceError {
    let message = message.into();
    ServiceError::Invalid(Invalid::new(message.clone(), vec![message]))
}
