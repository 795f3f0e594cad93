pub mod landing;
pub mod profile_service;
pub mod table_service;

use thiserror::Error;

use crate::database::{IdentifierError, StoreError};

pub use landing::{compute_landing_path, LandingResolver};
pub use profile_service::ProfileService;
pub use table_service::{Pagination, TableService};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdentifierError> for ServiceError {
    fn from(err: IdentifierError) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}
