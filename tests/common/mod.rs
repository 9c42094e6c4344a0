//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use monolith_api::domain::repositories::{RepositoryError, RepositoryResult, UserRepository};
use monolith_api::domain::user::User;
use monolith_api::server::{router, AppState};
use monolith_api::services::UserService;

/// bcrypt's minimum cost keeps hashing fast in tests
pub const TEST_HASH_COST: u32 = 4;

/// In-memory stand-in for the PostgreSQL repository
///
/// Enforces email uniqueness and truncates timestamps to microseconds like
/// `TIMESTAMPTZ` does, so round-trip assertions behave as against the store.
/// A reused id fails as a generic database error, as a primary-key violation
/// does in PostgreSQL.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
    calls: AtomicUsize,
}

impl InMemoryUserRepository {
    /// Number of repository operations invoked so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn email_taken(users: &HashMap<String, User>, email: &str, except_id: &str) -> bool {
        users
            .values()
            .any(|u| u.email.as_str() == email && u.id != except_id)
    }
}

fn truncate_micros(user: &mut User) {
    use chrono::DurationRound;
    let micro = chrono::Duration::microseconds(1);
    user.created_at = user.created_at.duration_trunc(micro).unwrap_or(user.created_at);
    user.updated_at = user.updated_at.duration_trunc(micro).unwrap_or(user.updated_at);
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, mut user: User) -> RepositoryResult<User> {
        self.touch();
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
                "duplicate key value violates unique constraint \"users_pkey\": {}",
                user.id
            ))));
        }
        if Self::email_taken(&users, user.email.as_str(), "") {
            return Err(RepositoryError::DuplicateEmail);
        }
        truncate_micros(&mut user);
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<User> {
        self.touch();
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<User> {
        self.touch();
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        self.touch();
        let users = self.users.lock().unwrap();
        Ok(Self::email_taken(&users, email, ""))
    }

    async fn update(&self, mut user: User) -> RepositoryResult<User> {
        self.touch();
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        if Self::email_taken(&users, user.email.as_str(), &user.id) {
            return Err(RepositoryError::DuplicateEmail);
        }
        user.updated_at = Utc::now();
        truncate_micros(&mut user);
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        self.touch();
        self.users
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Repository whose every operation panics
pub struct PanickingUserRepository;

#[async_trait]
impl UserRepository for PanickingUserRepository {
    async fn create(&self, _user: User) -> RepositoryResult<User> {
        panic!("repository exploded on create");
    }

    async fn get_by_id(&self, _id: &str) -> RepositoryResult<User> {
        panic!("repository exploded on get_by_id");
    }

    async fn get_by_email(&self, _email: &str) -> RepositoryResult<User> {
        panic!("repository exploded on get_by_email");
    }

    async fn exists_by_email(&self, _email: &str) -> RepositoryResult<bool> {
        panic!("repository exploded on exists_by_email");
    }

    async fn update(&self, _user: User) -> RepositoryResult<User> {
        panic!("repository exploded on update");
    }

    async fn delete(&self, _id: &str) -> RepositoryResult<()> {
        panic!("repository exploded on delete");
    }
}

/// Repository that stalls on lookups by id
pub struct StallingUserRepository {
    pub delay: Duration,
}

#[async_trait]
impl UserRepository for StallingUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        Ok(user)
    }

    async fn get_by_id(&self, _id: &str) -> RepositoryResult<User> {
        tokio::time::sleep(self.delay).await;
        Err(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, _email: &str) -> RepositoryResult<User> {
        Err(RepositoryError::NotFound)
    }

    async fn exists_by_email(&self, _email: &str) -> RepositoryResult<bool> {
        Ok(false)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        Ok(user)
    }

    async fn delete(&self, _id: &str) -> RepositoryResult<()> {
        Ok(())
    }
}

/// Router over the given repository
pub fn app_with(repo: Arc<dyn UserRepository>, request_timeout: Duration) -> Router {
    let service = UserService::new(repo).with_hash_cost(TEST_HASH_COST);
    router(AppState::new(service), request_timeout)
}

/// Router over an in-memory repository, returned with the repository handle
pub fn test_app() -> (Router, Arc<InMemoryUserRepository>) {
    let repo = Arc::new(InMemoryUserRepository::default());
    let app = app_with(repo.clone(), Duration::from_secs(5));
    (app, repo)
}
