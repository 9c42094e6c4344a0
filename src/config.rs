//! Environment-driven configuration
//!
//! Read once at startup. The binary loads `.env` through `dotenv` before
//! calling [`Config::from_env`]; real environment variables take precedence.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// bcrypt cost used when hashing passwords
    pub password_hash_cost: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_grace: Duration,
    /// Upper bound on a single request
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; overrides the individual fields when set
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_idle_time: Duration,
    pub max_lifetime: Duration,
    /// Period of the background ping; zero disables it
    pub health_check_interval: Duration,
}

impl DatabaseConfig {
    /// Connection options for the pool
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url);
        }

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode))
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let server = ServerConfig {
            host: env.parse_or("SERVER_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: env.parse_or("SERVER_PORT", 3000)?,
            shutdown_grace: env.secs_or("SHUTDOWN_GRACE_SECS", 30)?,
            request_timeout: env.secs_or("REQUEST_TIMEOUT_SECS", 60)?,
        };

        let database = DatabaseConfig {
            url: env.get("DATABASE_URL"),
            host: env.string_or("DB_HOST", "localhost"),
            port: env.parse_or("DB_PORT", 5432)?,
            user: env.string_or("DB_USER", "postgres"),
            password: env.string_or("DB_PASSWORD", "postgres"),
            name: env.string_or("DB_NAME", "users"),
            ssl_mode: env.parse_or("DB_SSLMODE", PgSslMode::Disable)?,
            max_connections: env.parse_or("DB_MAX_CONNECTIONS", 10)?,
            min_connections: env.parse_or("DB_MIN_CONNECTIONS", 2)?,
            max_idle_time: env.secs_or("DB_MAX_IDLE_SECS", 15 * 60)?,
            max_lifetime: env.secs_or("DB_MAX_LIFETIME_SECS", 60 * 60)?,
            health_check_interval: env.secs_or("DB_HEALTH_CHECK_SECS", 30)?,
        };

        if database.min_connections > database.max_connections {
            return Err(ConfigError::Invalid {
                key: "DB_MIN_CONNECTIONS",
                value: database.min_connections.to_string(),
                reason: format!("exceeds DB_MAX_CONNECTIONS ({})", database.max_connections),
            });
        }

        Ok(Self {
            server,
            database,
            password_hash_cost: env.parse_or("PASSWORD_HASH_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Blank values count as unset
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn secs_or(&self, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
        self.parse_or(key, default).map(Duration::from_secs)
    }
}
