use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::services::roles::RoleHierarchy;
use crate::services::token::{MAX_EXPIRY_MINUTES, MIN_SECRET_BYTES};

#[derive(Debug, Clone, Deserialize)]
pub struct MoviesConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret. `None` means a per-process random key.
    pub secret: Option<String>,
    pub expiry_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    /// `SENIOR>JUNIOR` rules, comma separated.
    pub role_hierarchy: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    /// Key the login limiter on `x-forwarded-for`. Only safe behind a proxy that overwrites it.
    pub trust_forwarded_for: bool,
}

impl Default for MoviesConfig {
    /// Development defaults, matching `from_env` with nothing set.
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "movies-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "movies".to_string(),
            },
            jwt: JwtConfig {
                secret: None,
                expiry_minutes: 60,
            },
            security: SecurityConfig {
                allowed_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:4200".to_string(),
                ],
                role_hierarchy: "ADMIN>USER".to_string(),
            },
            rate_limit: RateLimitConfig {
                login_attempts: 5,
                login_window_seconds: 900,
                trust_forwarded_for: false,
            },
        }
    }
}

impl MoviesConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = MoviesConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("movies-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("movies"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: if is_prod {
                    Some(get_env("JWT_SECRET", None, true)?)
                } else {
                    env::var("JWT_SECRET").ok().filter(|v| !v.is_empty())
                },
                expiry_minutes: parse_env("JWT_EXPIRY_MINUTES", "60", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000,http://localhost:4200"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
                role_hierarchy: get_env("ROLE_HIERARCHY", Some("ADMIN>USER"), is_prod)?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_env("RATE_LIMIT_LOGIN_ATTEMPTS", "5", is_prod)?,
                login_window_seconds: parse_env("RATE_LIMIT_LOGIN_WINDOW_SECONDS", "900", is_prod)?,
                trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR", "false", false)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn role_hierarchy(&self) -> Result<RoleHierarchy, AppError> {
        RoleHierarchy::parse(&self.security.role_hierarchy)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("ROLE_HIERARCHY: {}", e)))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.expiry_minutes <= 0 || self.jwt.expiry_minutes > MAX_EXPIRY_MINUTES {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_MINUTES must be between 1 and {}",
                MAX_EXPIRY_MINUTES
            )));
        }

        if let Some(secret) = &self.jwt.secret {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} bytes",
                    MIN_SECRET_BYTES
                )));
            }
        }

        if self.rate_limit.login_attempts == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RATE_LIMIT_LOGIN_ATTEMPTS must be positive"
            )));
        }

        self.role_hierarchy()?;

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MoviesConfig {
        MoviesConfig::default()
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_rejects_short_secret() {
        let mut config = base();
        config.jwt.secret = Some("too-short".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_expiry() {
        let mut config = base();
        config.jwt.expiry_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_expiry_beyond_one_year() {
        let mut config = base();
        config.jwt.expiry_minutes = MAX_EXPIRY_MINUTES + 1;
        assert!(config.validate().is_err());

        config.jwt.expiry_minutes = i64::MAX;
        assert!(config.validate().is_err());

        config.jwt.expiry_minutes = MAX_EXPIRY_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_forwarded_for_untrusted_by_default() {
        assert!(!base().rate_limit.trust_forwarded_for);
    }

    #[test]
    fn test_rejects_cyclic_hierarchy() {
        let mut config = base();
        config.security.role_hierarchy = "ADMIN>USER,USER>ADMIN".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_wildcard_origin_in_prod() {
        let mut config = base();
        config.environment = Environment::Prod;
        config.security.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut config = base();
        config.jwt.secret = Some("super-secret-value-that-is-long-enough!!".to_string());
        let rendered = format!("{:?}", config.jwt);
        assert!(!rendered.contains("super-secret"));
    }
}
