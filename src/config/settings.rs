//! Process settings from the environment (a `.env` file is honored by the binary via dotenvy).

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    /// JSON file with additional entity descriptors served without Rust code.
    pub entity_config_path: Option<PathBuf>,
    /// Create the built-in entity tables on startup.
    pub auto_migrate: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/qc".into()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?),
            max_body_bytes: parse_or(&get, "MAX_BODY_BYTES", 1024 * 1024)?,
            entity_config_path: get("ENTITY_CONFIG_PATH").map(PathBuf::from),
            auto_migrate: parse_or(&get, "AUTO_MIGRATE", false)?,
        })
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Settings(format!("{} has invalid value '{}'", key, v))),
    }
}
