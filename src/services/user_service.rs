use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::domain::user::password::{hash_password, DEFAULT_COST};
use crate::domain::user::{Email, User};

/// Service-tier error kinds
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("user not found")]
    UserNotFound,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    HashTask(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::UserNotFound,
            RepositoryError::DuplicateEmail => ServiceError::DuplicateEmail,
            other => ServiceError::Repository(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Input for [`UserService::create_user`]
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Caller-chosen id, stored as given; a UUID is generated when absent or blank
    pub id: Option<String>,
    pub email: String,
    pub password: String,
}

/// Input for [`UserService::update_user`]; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self {
            repository,
            hash_cost: DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost used for new passwords
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub async fn create_user(&self, input: NewUser) -> ServiceResult<User> {
        let email = parse_email(&input.email)?;

        if self.repository.exists_by_email(email.as_str()).await? {
            return Err(ServiceError::DuplicateEmail);
        }

        let id = input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let password = self.hash(input.password).await?;
        let user = self.repository.create(User::new(id, email, password)).await?;

        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        let id = require_id(id)?;
        Ok(self.repository.get_by_id(id).await?)
    }

    pub async fn update_user(&self, id: &str, changes: UserChanges) -> ServiceResult<User> {
        let id = require_id(id)?;
        let mut user = self.repository.get_by_id(id).await?;

        if let Some(raw) = changes.email {
            let email = parse_email(&raw)?;
            if email != user.email {
                if self.repository.exists_by_email(email.as_str()).await? {
                    return Err(ServiceError::DuplicateEmail);
                }
                user.email = email;
            }
        }

        if let Some(password) = changes.password {
            user.password = self.hash(password).await?;
        }

        let user = self.repository.update(user).await?;

        tracing::info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> ServiceResult<()> {
        let id = require_id(id)?;
        self.repository.delete(id).await?;

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// bcrypt is CPU-bound, so it runs on the blocking pool
    async fn hash(&self, plaintext: String) -> ServiceResult<String> {
        let cost = self.hash_cost;
        let hash = tokio::task::spawn_blocking(move || hash_password(&plaintext, cost)).await??;
        Ok(hash)
    }
}

fn parse_email(raw: &str) -> ServiceResult<Email> {
    Email::parse(raw).map_err(|e| ServiceError::InvalidInput(e.to_string()))
}

fn require_id(id: &str) -> ServiceResult<&str> {
    if id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("user id is required".to_string()));
    }
    Ok(id)
}
