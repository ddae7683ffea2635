//! Configuration Module
//!
//! Centralized configuration management for the contacts service, loaded from
//! environment variables (optionally via a `.env` file).

use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::path::PathBuf;
use thiserror::Error;

use crate::database::DatabaseConfig;

/// Configuration loading and validation errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Environment variable helpers
pub mod env {
    use super::ConfigError;
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get a non-empty environment variable, if set
    pub fn get_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as usize with default
    pub fn get_usize(key: &str, default: usize) -> usize {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        get_optional(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// bcrypt cost factor for password hashing
    pub bcrypt_cost: u32,

    /// SMTP settings; emails are only logged when absent
    pub email: Option<EmailConfig>,

    /// Avatar upload configuration
    pub avatar: AvatarConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Public base URL used to build links in emails and local avatar URLs
    pub base_url: String,
}

/// Longest accepted access token lifetime (one year)
pub const MAX_ACCESS_TOKEN_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Longest accepted email verification token lifetime
pub const MAX_EMAIL_TOKEN_DAYS: i64 = 365;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_expires_seconds: i64,
    pub email_token_expires_days: i64,
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_starttls: bool,
    pub smtp_ssl_tls: bool,
    pub from_name: String,
    pub from_email: String,
}

/// Where uploaded avatars are stored
#[derive(Debug, Clone, PartialEq)]
pub enum AvatarBackend {
    /// Files written under `dir` and served at `/static/avatars`
    Local { dir: PathBuf },
    Cloudinary {
        cloud_name: String,
        api_key: String,
        api_secret: String,
    },
}

/// Avatar upload configuration
#[derive(Debug, Clone)]
pub struct AvatarConfig {
    pub backend: AvatarBackend,
    pub max_bytes: usize,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per minute per client for `GET /users/me`
    pub me_per_minute: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let host = env::get_string("SERVER_HOST", "0.0.0.0");
        let port = env::get_u16("SERVER_PORT", 8000);
        let base_url = env::get_string("APP_BASE_URL", &format!("http://localhost:{}", port));

        Self {
            host,
            port,
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            me_per_minute: env::get_u32("ME_RATE_LIMIT_PER_MINUTE", 10),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let algorithm_name = env::get_string("JWT_ALGORITHM", "HS256");
        let algorithm = algorithm_name.parse::<Algorithm>().map_err(|_| {
            ConfigError::Invalid(format!("Unsupported JWT_ALGORITHM '{}'", algorithm_name))
        })?;

        Ok(Self {
            secret: env::get_required("JWT_SECRET")?,
            algorithm,
            access_token_expires_seconds: env::get_i64("JWT_EXPIRATION_SECONDS", 3600),
            email_token_expires_days: env::get_i64("MAIL_TOKEN_EXP_DAYS", 7),
        })
    }

    /// Access and email token lifetimes, rejecting values outside 1 second..=1 year
    /// and 1..=365 days
    pub fn lifetimes(&self) -> Result<(Duration, Duration), ConfigError> {
        let access = Some(self.access_token_expires_seconds)
            .filter(|s| (1..=MAX_ACCESS_TOKEN_SECONDS).contains(s))
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "JWT_EXPIRATION_SECONDS must be between 1 and {}",
                    MAX_ACCESS_TOKEN_SECONDS
                ))
            })?;

        let email = Some(self.email_token_expires_days)
            .filter(|d| (1..=MAX_EMAIL_TOKEN_DAYS).contains(d))
            .and_then(Duration::try_days)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "MAIL_TOKEN_EXP_DAYS must be between 1 and {}",
                    MAX_EMAIL_TOKEN_DAYS
                ))
            })?;

        Ok((access, email))
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let smtp_host = match env::get_optional("SMTP_HOST") {
            Some(host) => host,
            None => return Ok(None),
        };

        // Implicit TLS turns STARTTLS off unless it is set explicitly
        let smtp_ssl_tls = env::get_bool("SMTP_SSL_TLS", false);

        Ok(Some(Self {
            smtp_host,
            smtp_port: env::get_u16("SMTP_PORT", 587),
            smtp_username: env::get_optional("SMTP_USERNAME"),
            smtp_password: env::get_optional("SMTP_PASSWORD"),
            smtp_starttls: env::get_bool("SMTP_STARTTLS", !smtp_ssl_tls),
            smtp_ssl_tls,
            from_name: env::get_string("MAIL_FROM_NAME", "Contacts Service"),
            from_email: env::get_required("MAIL_FROM")?,
        }))
    }
}

impl AvatarConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::get_string("AVATAR_STORAGE", "local")
            .to_ascii_lowercase()
            .as_str()
        {
            "local" => AvatarBackend::Local {
                dir: PathBuf::from(env::get_string("AVATAR_DIR", "uploads/avatars")),
            },
            "cloudinary" => AvatarBackend::Cloudinary {
                cloud_name: env::get_required("CLOUDINARY_NAME")?,
                api_key: env::get_required("CLOUDINARY_API_KEY")?,
                api_secret: env::get_required("CLOUDINARY_API_SECRET")?,
            },
            other => {
                return Err(ConfigError::Invalid(format!(
                    "AVATAR_STORAGE must be 'local' or 'cloudinary', got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            backend,
            max_bytes: env::get_usize("AVATAR_MAX_BYTES", 5 * 1024 * 1024),
        })
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            bcrypt_cost: env::get_u32("BCRYPT_COST", bcrypt::DEFAULT_COST),
            email: EmailConfig::from_env()?,
            avatar: AvatarConfig::from_env()?,
            rate_limit: RateLimitConfig::default(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server configuration
        if self.server.port == 0 {
            return Err(ConfigError::Invalid(
                "Server port must be greater than 0".into(),
            ));
        }

        // Validate database configuration
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".into(),
            ));
        }

        // Validate JWT configuration
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Invalid("JWT secret cannot be empty".into()));
        }

        if !matches!(
            self.jwt.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::Invalid(
                "JWT_ALGORITHM must be one of HS256, HS384, HS512".into(),
            ));
        }

        self.jwt.lifetimes()?;

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(
                "BCRYPT_COST must be between 4 and 31".into(),
            ));
        }

        if let Some(email) = &self.email {
            if email.smtp_starttls && email.smtp_ssl_tls {
                return Err(ConfigError::Invalid(
                    "SMTP_STARTTLS and SMTP_SSL_TLS are mutually exclusive".into(),
                ));
            }
        }

        if self.avatar.max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "AVATAR_MAX_BYTES must be greater than 0".into(),
            ));
        }

        if self.rate_limit.me_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "ME_RATE_LIMIT_PER_MINUTE must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
