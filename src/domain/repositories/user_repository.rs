use async_trait::async_trait;
use thiserror::Error;

use crate::domain::user::User;

/// Storage-tier error kinds
///
/// `NotFound` and `DuplicateEmail` are the only kinds callers are expected to
/// branch on; everything else is a generic failure.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("query timed out")]
    Timeout,

    #[error("invalid record in store: {0}")]
    InvalidRecord(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository trait for the User aggregate
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return it as stored
    async fn create(&self, user: User) -> RepositoryResult<User>;

    /// Find a user by id
    async fn get_by_id(&self, id: &str) -> RepositoryResult<User>;

    /// Find a user by email address
    async fn get_by_email(&self, email: &str) -> RepositoryResult<User>;

    /// Whether any user already has this email
    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool>;

    /// Overwrite email and password, refreshing `updated_at`
    async fn update(&self, user: User) -> RepositoryResult<User>;

    /// Remove a user by id
    async fn delete(&self, id: &str) -> RepositoryResult<()>;
}
