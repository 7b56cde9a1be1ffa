use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::info;

/// Cost bounds accepted by `bcrypt::hash`.
pub const BCRYPT_MIN_COST: u32 = 4;
pub const BCRYPT_MAX_COST: u32 = 31;

#[derive(Debug, Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub pin_max_attempts: u32,
    pub bcrypt_cost: u32,
    pub session_inactivity_minutes: i64,
    pub session_secure_cookie: bool,
    pub realtime_capacity: usize,
    pub cors_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://pinchat.db?mode=rwc".to_owned(),
            bind_addr: "0.0.0.0:8080".to_owned(),
            db_max_connections: 16,
            pin_max_attempts: 32,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_inactivity_minutes: 60,
            session_secure_cookie: false,
            realtime_capacity: 256,
            cors_origin: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let config = Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            pin_max_attempts: parse(&lookup, "PIN_MAX_ATTEMPTS", defaults.pin_max_attempts)?,
            bcrypt_cost: parse(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            session_inactivity_minutes: parse(&lookup, "SESSION_INACTIVITY_MINUTES", defaults.session_inactivity_minutes)?,
            session_secure_cookie: parse(&lookup, "SESSION_SECURE_COOKIE", defaults.session_secure_cookie)?,
            realtime_capacity: parse(&lookup, "REALTIME_CAPACITY", defaults.realtime_capacity)?,
            cors_origin: lookup("CORS_ORIGIN").filter(|origin| !origin.is_empty()),
        };

        if config.pin_max_attempts == 0 {
            return Err(ConfigError { key: "PIN_MAX_ATTEMPTS", message: "must be at least 1".to_owned() });
        }
        if config.realtime_capacity == 0 {
            return Err(ConfigError { key: "REALTIME_CAPACITY", message: "must be at least 1".to_owned() });
        }
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&config.bcrypt_cost) {
            return Err(ConfigError {
                key: "BCRYPT_COST",
                message: format!("must be between {BCRYPT_MIN_COST} and {BCRYPT_MAX_COST}"),
            });
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError { key, message: e.to_string() }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
