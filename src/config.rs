use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::env;
use config;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub database_path: String,
    pub media_path: String,
    pub public_base_url: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub admin_url_prefix: String,
    pub use_secure_cookies: bool,
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let database_path = env::var("DATABASE_PATH")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'DATABASE_PATH' is not set in your .env file.".to_string()
            ))?;

        let media_path = env::var("MEDIA_PATH")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'MEDIA_PATH' is not set in your .env file.".to_string()
            ))?;

        let session_secret_key = env::var("SESSION_SECRET_KEY")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'SESSION_SECRET_KEY' is not set in your .env file.".to_string()
            ))?;

        // The session key must be 128 hex characters (64 bytes).
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string()
            ));
        }

        let admin_url_prefix = env::var("ADMIN_URL_PREFIX")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'ADMIN_URL_PREFIX' is not set in your .env file.".to_string()
            ))?;

        if admin_url_prefix.is_empty() || !admin_url_prefix.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(config::ConfigError::Message(
                "FATAL: 'ADMIN_URL_PREFIX' must not be empty and can only contain letters, numbers, underscores, and hyphens.".to_string()
            ));
        }

        // Canonical origin for generated links (sitemap, llms.txt, redirects).
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'PUBLIC_BASE_URL' is not set in your .env file.".to_string()
            ))?;

        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(config::ConfigError::Message(
                "FATAL: 'PUBLIC_BASE_URL' must be an absolute http(s) origin, e.g. https://example.com".to_string()
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "".to_string());

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        if Path::new(&media_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'MEDIA_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                media_path
            )));
        }

        let builder = config::Config::builder()
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("media_path", media_path)?
            .set_override("public_base_url", public_base_url)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("admin_url_prefix", admin_url_prefix)?
            .build()?;

        builder.try_deserialize()
    }

    /// Returns the full path to the leads database file inside its own folder.
    pub fn leads_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("leads")
            .join("leads.db")
    }

    /// Returns the full path to the content database file inside its own folder.
    pub fn content_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("content")
            .join("content.db")
    }
}
