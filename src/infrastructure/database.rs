//! PostgreSQL pool management
//!
//! Opens the shared [`PgPool`], verifies it with a ping, keeps it under a
//! periodic health check and applies the embedded migrations.

use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use tokio::task::JoinHandle;

use crate::config::DatabaseConfig;

/// SQLSTATE for `unique_violation`
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Unique constraint on `users.email`, named in the create-table migration
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Migrations under `migrations/`, embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens a connection pool sized and tuned from configuration
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = config.connect_options()?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .idle_timeout(config.max_idle_time)
        .max_lifetime(config.max_lifetime)
        .connect_with(options)
        .await
}

/// Verifies a pooled connection is alive
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    conn.ping().await
}

/// Pings the pool every `interval` for the lifetime of the process
///
/// Returns `None` when `interval` is zero (health checks disabled).
pub fn spawn_health_check(pool: PgPool, interval: Duration) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately; startup already pinged
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match ping(&pool).await {
                Ok(()) => tracing::debug!("database health check passed"),
                Err(e) => tracing::warn!(error = %e, "database health check failed"),
            }
        }
    }))
}

/// Applies pending migrations; already-applied ones are skipped
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Applies migrations, then starts the periodic health check
///
/// No background task is left running when the migrations fail.
pub async fn migrate_then_monitor(
    pool: &PgPool,
    interval: Duration,
) -> Result<Option<JoinHandle<()>>, MigrateError> {
    run_migrations(pool).await?;
    tracing::info!("Database migrations applied");

    Ok(spawn_health_check(pool.clone(), interval))
}

/// Whether the driver reported that the query matched no rows
pub fn is_no_rows(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::RowNotFound)
}

/// Whether the driver reported a violation of the named unique constraint
///
/// Violations of any other constraint (the primary key, for one) do not match.
pub fn is_unique_violation_on(err: &sqlx::Error, constraint: &str) -> bool {
    let Some(db) = err.as_database_error() else {
        return false;
    };

    db.code().is_some_and(|code| code == UNIQUE_VIOLATION_CODE)
        && db.constraint() == Some(constraint)
}
