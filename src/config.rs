use std::{env, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub objects_per_page: usize,
    pub index_cache_seconds: u64,
    pub media_root: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn init() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;

        Ok(Self {
            database_url,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            jwt_maxage: optional("JWT_MAXAGE", 60)?,
            port: optional("PORT", 8080)?,
            objects_per_page: optional("OBJECTS_PER_PAGE", 10)?,
            index_cache_seconds: optional("INDEX_CACHE_SECONDS", 20)?,
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            admin_username: env::var("ADMIN_USERNAME").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn optional<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid(key, value)),
        Err(_) => Ok(default),
    }
}
