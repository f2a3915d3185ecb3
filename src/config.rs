//! Order store configuration, loaded from environment variables.
//!
//! A `.env` file in the working directory is read first when present.
//!
//! - `DATABASE_URL` (required): Postgres connection string
//! - `ORDER_DB_MAX_CONNECTIONS`: pool size (default: 10)
//! - `ORDER_DB_ACQUIRE_TIMEOUT_SECS`: pool acquire timeout (default: 5)
//! - `ORDER_DB_CONNECT_RETRY_DELAY_MS`: delay between connect attempts (default: 2000)
//! - `ORDER_DB_CONNECT_MAX_ATTEMPTS`: connect attempts, `0` = unbounded (default: 0)

use std::time::Duration;

use crate::utils::RetryPolicy;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CONNECT_RETRY_DELAY_MS: u64 = 2000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, PartialEq)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub connect_retry: RetryPolicy,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("connect_retry", &self.connect_retry)
            .finish()
    }
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            connect_retry: RetryPolicy::forever(Duration::from_millis(DEFAULT_CONNECT_RETRY_DELAY_MS)),
        }
    }

    pub fn with_connect_retry(mut self, policy: RetryPolicy) -> Self {
        self.connect_retry = policy;
        self
    }

    /// Load from the process environment, after applying `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections =
            parse_or(&lookup, "ORDER_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "ORDER_DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        let acquire_timeout_secs =
            parse_or(&lookup, "ORDER_DB_ACQUIRE_TIMEOUT_SECS", DEFAULT_ACQUIRE_TIMEOUT_SECS)?;
        let retry_delay_ms =
            parse_or(&lookup, "ORDER_DB_CONNECT_RETRY_DELAY_MS", DEFAULT_CONNECT_RETRY_DELAY_MS)?;
        let max_attempts: u32 = parse_or(&lookup, "ORDER_DB_CONNECT_MAX_ATTEMPTS", 0)?;

        let delay = Duration::from_millis(retry_delay_ms);
        let connect_retry = match max_attempts {
            0 => RetryPolicy::forever(delay),
            attempts => RetryPolicy::fixed(delay, attempts),
        };

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            connect_retry,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
