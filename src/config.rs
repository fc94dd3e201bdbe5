use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::publish::DEFAULT_API_BASE;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // Populated from the .env file
    pub database_path: String,
    pub media_path: String,
    pub jwt_secret_key: String,
    pub token_ttl_hours: i64,
    pub max_upload_size_mb: u64,
    pub allowed_origins: String,
    pub log_level: String,
    pub publish_api_base: String,
}

fn fatal(message: String) -> config::ConfigError {
    config::ConfigError::Message(format!("FATAL: {}", message))
}

fn required_var(name: &str) -> Result<String, config::ConfigError> {
    env::var(name).map_err(|_| fatal(format!("Environment variable '{}' is not set in your .env file.", name)))
}

pub fn validate_absolute_path(name: &str, value: &str) -> Result<(), config::ConfigError> {
    if Path::new(value).is_relative() {
        return Err(fatal(format!(
            "The '{}' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
            name, value
        )));
    }
    Ok(())
}

/// The signing key must be 128 hex characters (64 bytes).
pub fn validate_secret_key(value: &str) -> Result<(), config::ConfigError> {
    if value.len() != 128 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(fatal(
            "'JWT_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string(),
        ));
    }
    Ok(())
}

/// Parses an optional positive integer variable, falling back to `default` when unset.
pub fn parse_positive(name: &str, value: Option<String>, default: i64) -> Result<i64, config::ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(fatal(format!("'{}' must be a positive whole number, got '{}'.", name, raw))),
        },
    }
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            fatal(format!("Failed to load .env file from '{}'. Error: {}", env_path.display(), e))
        })?;

        let database_path = required_var("DATABASE_PATH")?;
        let media_path = required_var("MEDIA_PATH")?;
        validate_absolute_path("DATABASE_PATH", &database_path)?;
        validate_absolute_path("MEDIA_PATH", &media_path)?;

        let jwt_secret_key = required_var("JWT_SECRET_KEY")?;
        validate_secret_key(&jwt_secret_key)?;

        let token_ttl_hours = parse_positive("TOKEN_TTL_HOURS", env::var("TOKEN_TTL_HOURS").ok(), 24)?;
        let max_upload_size_mb = parse_positive("MAX_UPLOAD_SIZE_MB", env::var("MAX_UPLOAD_SIZE_MB").ok(), 500)?;

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let publish_api_base = env::var("PUBLISH_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let builder = config::Config::builder()
            // Web host/port come from the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("media_path", media_path)?
            .set_override("jwt_secret_key", jwt_secret_key)?
            .set_override("token_ttl_hours", token_ttl_hours)?
            .set_override("max_upload_size_mb", max_upload_size_mb)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("publish_api_base", publish_api_base)?
            .build()?;

        builder.try_deserialize()
    }

    /// `<DATABASE_PATH>/users/users.db`
    pub fn users_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("users").join("users.db")
    }

    /// `<DATABASE_PATH>/videos/videos.db`
    pub fn videos_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("videos").join("videos.db")
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }

    pub fn jwt_secret_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.jwt_secret_key)
    }
}
