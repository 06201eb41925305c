//! Process configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `AGORA_BIND_ADDR`: listen address (default: 0.0.0.0:8080)
//! - `DATABASE_URL`: Postgres connection string; unset or empty means in-memory stores
//! - `AGORA_LOG_FORMAT`: `json` or `pretty` (default: json)
//! - `AGORA_ARGON2_M`, `AGORA_ARGON2_T`, `AGORA_ARGON2_P`: password hashing cost
//!   (memory KiB, iterations, parallelism; defaults are Argon2's)
//! - `AGORA_SESSION_TTL_SECS`: session lifetime in seconds (default: 86400)

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use agora_auth::HashingCost;
use agora_infra::store::DEFAULT_SESSION_TTL;
use agora_observability::LogFormat;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    pub hashing: HashingCost,
    pub session_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            log_format: LogFormat::Json,
            hashing: HashingCost::default(),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = HashingCost::default();

        let bind_addr = lookup("AGORA_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = parse("AGORA_BIND_ADDR", &bind_addr)?;

        let database_url = lookup("DATABASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let log_format = match lookup("AGORA_LOG_FORMAT") {
            Some(v) => parse("AGORA_LOG_FORMAT", &v)?,
            None => LogFormat::Json,
        };

        let hashing = HashingCost {
            memory_kib: parse_or("AGORA_ARGON2_M", lookup("AGORA_ARGON2_M"), defaults.memory_kib)?,
            iterations: parse_or("AGORA_ARGON2_T", lookup("AGORA_ARGON2_T"), defaults.iterations)?,
            parallelism: parse_or("AGORA_ARGON2_P", lookup("AGORA_ARGON2_P"), defaults.parallelism)?,
        };

        let session_ttl = match lookup("AGORA_SESSION_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = parse("AGORA_SESSION_TTL_SECS", &raw)?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "AGORA_SESSION_TTL_SECS",
                        value: raw,
                        reason: "must be at least one second".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_SESSION_TTL,
        };

        Ok(Self {
            bind_addr,
            database_url,
            log_format,
            hashing,
            session_ttl,
        })
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}
