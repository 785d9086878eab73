//! Directory core: users, organisations and membership.
//!
//! The core never sees HTTP types. Callers hand it validated-or-raw request
//! bodies plus the verified caller identity, and it talks to storage only
//! through [`DirectoryStore`].

use thiserror::Error;

use crate::auth::AuthError;
use crate::models::FieldError;

pub mod access;
pub mod memory_store;
pub mod pg_store;
pub mod service;
pub mod store;
pub mod validation;

pub use access::AccessControl;
pub use memory_store::InMemoryDirectoryStore;
pub use pg_store::PgDirectoryStore;
pub use service::DirectoryService;
pub use store::{DirectoryStore, StoreError, StoreResult};

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("email already exists")]
    DuplicateEmail,
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<Vec<FieldError>> for DirectoryError {
    fn from(errors: Vec<FieldError>) -> Self {
        DirectoryError::Validation(errors)
    }
}

impl From<tokio::task::JoinError> for DirectoryError {
    fn from(err: tokio::task::JoinError) -> Self {
        DirectoryError::Task(err.to_string())
    }
}
