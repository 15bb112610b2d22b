//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::Duration;
use std::net::SocketAddr;
use tracing::Level;

/// Signing key used when `JWT_SECRET` is not set. Fine for local development only.
pub const DEVELOPMENT_JWT_SECRET: &str = "student-dashboard-development-secret";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub jwt_secret: String,
    /// Token lifetime as configured, e.g. `24h`. Echoed to clients as `expiresIn`.
    pub jwt_expires_in: String,
    pub jwt_ttl: Duration,
    /// `development`, `production`, ...; reported by the health check.
    pub environment: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3001");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var_or("DATABASE_URL", "sqlite://database.sqlite?mode=rwc");
        if database_url.trim().is_empty() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Token Settings ---
        let jwt_secret = var_or("JWT_SECRET", DEVELOPMENT_JWT_SECRET);
        let jwt_expires_in = var_or("JWT_EXPIRES_IN", "24h");
        let jwt_ttl = parse_duration(&jwt_expires_in).ok_or_else(|| {
            ConfigError::InvalidValue(
                "JWT_EXPIRES_IN".to_string(),
                format!("'{}' is not a duration like 30m, 24h or 7d", jwt_expires_in),
            )
        })?;

        // --- Deployment Settings ---
        let environment = var_or("APP_ENV", "development");
        let allowed_origins = var_or(
            "ALLOWED_ORIGINS",
            "http://localhost:3000,http://127.0.0.1:3000",
        )
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            jwt_expires_in,
            jwt_ttl,
            environment,
            allowed_origins,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Parses `<n>s`, `<n>m`, `<n>h` or `<n>d`. A bare number is seconds.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&value[..i], c),
        _ => (value, 's'),
    };
    let amount: i64 = digits.parse().ok().filter(|n| *n > 0)?;
    match unit {
        's' => Some(Duration::seconds(amount)),
        'm' => Some(Duration::minutes(amount)),
        'h' => Some(Duration::hours(amount)),
        'd' => Some(Duration::days(amount)),
        _ => None,
    }
}
