//! Persistence port consumed by the directory core.
//!
//! Adapters must make `create_user` and `create_organisation` atomic: the
//! record and its creator membership are written together or not at all.

use rocket_db_pools::sqlx;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Organisation, User};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("constraint violated: {constraint}")]
    Conflict { constraint: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn conflict(constraint: impl Into<String>) -> Self {
        StoreError::Conflict {
            constraint: constraint.into(),
        }
    }
}

#[rocket::async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Cheap reachability probe used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    /// Exact, case-sensitive email lookup.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    /// Insert a user together with its default organisation and membership.
    async fn create_user(&self, user: &User, default_org: &Organisation) -> StoreResult<()>;

    async fn find_organisation_by_id(&self, org_id: Uuid) -> StoreResult<Option<Organisation>>;

    /// Insert an organisation with `creator_id` as its first member.
    async fn create_organisation(&self, org: &Organisation, creator_id: Uuid) -> StoreResult<()>;

    /// Record a membership. Returns `false` when it already existed.
    async fn append_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    async fn is_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    async fn list_organisations_for(&self, user_id: Uuid) -> StoreResult<Vec<Organisation>>;

    /// Whether two users belong to at least one common organisation.
    async fn shares_organisation(&self, first: Uuid, second: Uuid) -> StoreResult<bool>;
}
