//! HTTP server assembly
//!
//! Wires config → pool → migrations → repository → service → router, and
//! serves until a termination signal, draining in-flight requests for at
//! most the configured grace period.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::migrate::MigrateError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::errors::panic_response;
use crate::api::handlers::{health, users};
use crate::config::{Config, ConfigError};
use crate::infrastructure::database;
use crate::infrastructure::repositories::PostgresUserRepository;
use crate::services::UserService;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("graceful shutdown exceeded {0:?}; forcing exit")]
    ShutdownTimeout(Duration),
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database health check failed: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migrate(#[from] MigrateError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(users: UserService) -> Self {
        Self {
            users: Arc::new(users),
        }
    }
}

/// Builds the router with all routes and middleware
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/users", post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::custom(panic_response))
                // elapsed requests get 408 Request Timeout
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors),
        )
        .with_state(state)
}

/// Serves `app` until `signal` resolves, then drains connections
///
/// Returns [`ServerError::ShutdownTimeout`] when in-flight requests are still
/// running `grace` after the signal.
pub async fn serve<S>(
    listener: TcpListener,
    app: Router,
    signal: S,
    grace: Duration,
) -> Result<(), ServerError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let (fired_tx, fired_rx) = oneshot::channel::<()>();

    let shutdown = async move {
        signal.await;
        tracing::info!(grace = ?grace, "shutdown signal received, draining connections");
        let _ = fired_tx.send(());
    };

    let deadline = async move {
        if fired_rx.await.is_err() {
            // server finished without a signal
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result.map_err(ServerError::from),
        () = deadline => Err(ServerError::ShutdownTimeout(grace)),
    }
}

/// Resolves on Ctrl+C, or SIGTERM/SIGHUP/SIGQUIT on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!(signal = "SIGINT", "received signal"),
            Err(e) => {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::SignalKind;

        tokio::select! {
            () = unix_signal(SignalKind::terminate(), "SIGTERM") => {},
            () = unix_signal(SignalKind::hangup(), "SIGHUP") => {},
            () = unix_signal(SignalKind::quit(), "SIGQUIT") => {},
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(unix)]
async fn unix_signal(kind: tokio::signal::unix::SignalKind, name: &'static str) {
    match tokio::signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
            tracing::info!(signal = name, "received signal");
        }
        Err(e) => {
            tracing::error!(signal = name, error = %e, "failed to install signal handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Runs the service from configuration until shutdown
pub async fn run(config: Config) -> Result<(), StartupError> {
    tracing::info!("Connecting to database...");
    let pool = database::connect(&config.database)
        .await
        .map_err(StartupError::Connect)?;

    database::ping(&pool).await.map_err(StartupError::Ping)?;
    tracing::info!("Database connected successfully");

    let health_check =
        database::migrate_then_monitor(&pool, config.database.health_check_interval).await?;

    let repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let service = UserService::new(repository).with_hash_cost(config.password_hash_cost);
    let app = router(AppState::new(service), config.server.request_timeout);

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!("Server listening on {}", addr);

    let result = serve(listener, app, shutdown_signal(), config.server.shutdown_grace).await;

    if let Some(handle) = health_check {
        handle.abort();
    }
    pool.close().await;

    result?;
    tracing::info!("Server stopped gracefully");
    Ok(())
}
