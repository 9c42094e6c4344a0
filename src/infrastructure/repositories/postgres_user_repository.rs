use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::domain::repositories::{RepositoryError, RepositoryResult, UserRepository};
use crate::domain::user::{Email, User};
use crate::infrastructure::database::{is_no_rows, is_unique_violation_on, USERS_EMAIL_KEY};

/// Upper bound on any single statement issued by the repository
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Row shape of the `users` table
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::InvalidRecord(format!("user {} has invalid email: {}", row.id, e))
        })?;

        Ok(User {
            id: row.id,
            email,
            password: row.password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if is_no_rows(&err) {
            RepositoryError::NotFound
        } else if is_unique_violation_on(&err, USERS_EMAIL_KEY) {
            RepositoryError::DuplicateEmail
        } else {
            RepositoryError::Database(err)
        }
    }
}

/// Runs a statement under [`QUERY_TIMEOUT`], classifying driver errors
async fn bounded<T, F>(query: F) -> RepositoryResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, query).await {
        Ok(result) => result.map_err(RepositoryError::from),
        Err(_) => Err(RepositoryError::Timeout),
    }
}

/// PostgreSQL implementation of UserRepository
///
/// Statements are built at runtime (`sqlx::query_as`) so the crate compiles
/// without a live database or an offline query cache.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let row: UserRow = bounded(
            sqlx::query_as::<_, UserRow>(
                r#"
                INSERT INTO users (id, email, password, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, email, password, created_at, updated_at
                "#,
            )
            .bind(&user.id)
            .bind(user.email.as_str())
            .bind(&user.password)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool),
        )
        .await?;

        tracing::debug!(user_id = %row.id, "user created");
        row.try_into()
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<User> {
        let row: UserRow = bounded(
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT id, email, password, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_one(&self.pool),
        )
        .await?;

        row.try_into()
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<User> {
        let row: UserRow = bounded(
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT id, email, password, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_one(&self.pool),
        )
        .await?;

        row.try_into()
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        bounded(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        // zero rows updated surfaces as RowNotFound from fetch_one
        let row: UserRow = bounded(
            sqlx::query_as::<_, UserRow>(
                r#"
                UPDATE users
                SET email = $1, password = $2, updated_at = NOW()
                WHERE id = $3
                RETURNING id, email, password, created_at, updated_at
                "#,
            )
            .bind(user.email.as_str())
            .bind(&user.password)
            .bind(&user.id)
            .fetch_one(&self.pool),
        )
        .await?;

        row.try_into()
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let result = bounded(
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
