//! Process configuration read from the environment (and a `.env` file in `main`).
//!
//! Parsing goes through a lookup closure, so tests can feed values without touching
//! the real process environment.

use std::env;
use std::str::FromStr;

use crate::auth::password::{DEFAULT_COST, MAX_COST, MIN_COST};
use crate::auth::AuthMode;

/// Secrets shorter than this are refused at startup.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where users and tasks are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local maps; data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// `JWT_SECRET` in bearer mode, `SESSION_SECRET` in session mode.
    pub secret: String,
    pub ttl_hours: i64,
    pub secure_cookie: bool,
    pub bcrypt_cost: u32,
}

/// Credentials of the administrator ensured at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store: StoreBackend,
    /// Present whenever `store` is `Postgres`.
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let server_port = parse_or("SERVER_PORT", get("SERVER_PORT"), 8080u16)?;

        let store = parse_or("STORE_BACKEND", get("STORE_BACKEND"), StoreBackend::Postgres)?;
        let database = match store {
            StoreBackend::Postgres => Some(DatabaseConfig {
                url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS"),
                    10u32,
                )?,
            }),
            StoreBackend::Memory => None,
        };

        let mode = parse_or("AUTH_MODE", get("AUTH_MODE"), AuthMode::Bearer)?;
        let secret_var = match mode {
            AuthMode::Bearer => "JWT_SECRET",
            AuthMode::Session => "SESSION_SECRET",
        };
        let secret = get(secret_var).ok_or(ConfigError::Missing(secret_var))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: secret_var,
                reason: format!("must be at least {} characters long", MIN_SECRET_LEN),
            });
        }

        let ttl_hours = parse_or("TOKEN_TTL_HOURS", get("TOKEN_TTL_HOURS"), 24i64)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_HOURS",
                reason: "must be positive".to_string(),
            });
        }

        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), DEFAULT_COST)?;
        if !(MIN_COST..=MAX_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                reason: format!("must lie in {}..={}", MIN_COST, MAX_COST),
            });
        }

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        Ok(Self {
            server_host,
            server_port,
            store,
            database,
            auth: AuthConfig {
                mode,
                secret,
                ttl_hours,
                secure_cookie: parse_or(
                    "SESSION_COOKIE_SECURE",
                    get("SESSION_COOKIE_SECURE"),
                    false,
                )?,
                bcrypt_cost,
            },
            admin,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
