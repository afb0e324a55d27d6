//! Configuration management

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRY, DEFAULT_PREVIEW_TOKEN_EXPIRY, DEFAULT_REFRESH_TOKEN_EXPIRY,
    MIN_JWT_SECRET_LENGTH,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub rate_limit: RateLimitSettings,
    pub cors: CorsSettings,
    pub ai: AiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Base URL of the customer-facing web app, used in QR targets and email links.
    pub frontend_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub preview_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    pub window_secs: u64,
    pub max_requests: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub advanced_model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub dir: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", env.as_str())?
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3001)?
            .set_default("app.name", "qrest-server")?
            .set_default("app.frontend_url", "http://localhost:3000")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.max_connections", 16)?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("jwt.refresh_token_expiry", DEFAULT_REFRESH_TOKEN_EXPIRY)?
            .set_default("jwt.preview_token_expiry", DEFAULT_PREVIEW_TOKEN_EXPIRY)?
            .set_default("rate_limit.window_secs", 900)?
            .set_default("rate_limit.max_requests", 100)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("ai.base_url", "https://api.openai.com")?
            .set_default("ai.default_model", "gpt-3.5-turbo")?
            .set_default("ai.advanced_model", "gpt-4")?
            .set_default("ai.timeout_seconds", 60)?
            .set_default("log.level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run safely with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.access_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::InvalidSetting(format!(
                "jwt.access_secret must be at least {} characters",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        if self.jwt.refresh_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::InvalidSetting(format!(
                "jwt.refresh_secret must be at least {} characters",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        if self.database.url.trim().is_empty() {
            return Err(AppError::InvalidSetting("database.url is required".into()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            env: "test".into(),
            host: "127.0.0.1".into(),
            port: 3001,
            name: "qrest-server".into(),
            frontend_url: "http://localhost:3000".into(),
        },
        database: DatabaseSettings {
            url: "postgres://localhost/qrest".into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_seconds: 3,
        },
        redis: RedisSettings {
            url: "redis://127.0.0.1:6379".into(),
            max_connections: 4,
        },
        jwt: JwtSettings {
            access_secret: "a".repeat(32),
            refresh_secret: "r".repeat(32),
            access_token_expiry: DEFAULT_ACCESS_TOKEN_EXPIRY,
            refresh_token_expiry: DEFAULT_REFRESH_TOKEN_EXPIRY,
            preview_token_expiry: DEFAULT_PREVIEW_TOKEN_EXPIRY,
        },
        rate_limit: RateLimitSettings {
            window_secs: 900,
            max_requests: 100,
        },
        cors: CorsSettings {
            allowed_origins: vec!["http://localhost:3000".into()],
        },
        ai: AiSettings {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            default_model: "gpt-3.5-turbo".into(),
            advanced_model: "gpt-4".into(),
            timeout_seconds: 60,
        },
        log: LogSettings {
            level: "info".into(),
            dir: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = test_config();
        config.jwt.refresh_secret = "short".into();
        assert!(matches!(config.validate(), Err(AppError::InvalidSetting(_))));
    }

    #[test]
    fn test_production_flag() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.app.env = "production".into();
        assert!(config.is_production());
    }
}
