use crate::error::{Error, Result};
use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub db_max_connections: u32,
    pub db_statement_timeout_ms: u64,
    pub uploads_dir: String,
    pub page_size: i64,
    pub display_utc_offset_minutes: i32,
    pub max_upload_bytes: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            db_max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", 20)?,
            db_statement_timeout_ms: get_env_parse_or("DB_STATEMENT_TIMEOUT_MS", 15_000)?,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            page_size: get_env_parse_or("PAGE_SIZE", 10)?,
            display_utc_offset_minutes: get_env_parse_or("DISPLAY_UTC_OFFSET_MINUTES", -180)?,
            max_upload_bytes: get_env_parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        };

        if config.page_size < 1 {
            return Err(Error::Config("PAGE_SIZE must be at least 1".to_string()));
        }
        if config.display_offset().is_none() {
            return Err(Error::Config(
                "DISPLAY_UTC_OFFSET_MINUTES is out of range".to_string(),
            ));
        }

        Ok(config)
    }

    /// Offset used to render timestamps and to resolve "today" for date filters.
    pub fn display_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.display_utc_offset_minutes.checked_mul(60)?)
    }

    pub fn local_offset(&self) -> FixedOffset {
        self.display_offset()
            .or_else(|| FixedOffset::west_opt(3 * 3600))
            .unwrap_or_else(|| Utc.fix())
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
