// Application configuration loaded from environment variables

use axum::http::HeaderValue;
use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("SECRET_KEY and STATE_SECRET_KEY must differ")]
    SharedSecret,
}

/// Signing material and lifetimes for account and state tokens
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret_key: String,
    pub state_secret_key: String,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub state_ttl: Duration,
}

/// Google OAuth client and endpoint configuration
#[derive(Debug, Clone)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub certs_url: String,
    pub key_cache_lifetime: Duration,
    pub http_timeout: std::time::Duration,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:8080/auth/google/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            certs_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
            key_cache_lifetime: Duration::hours(1),
            http_timeout: std::time::Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub debug: bool,
    pub port: u16,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub tokens: TokenSettings,
    pub google: GoogleSettings,
    pub frontend_success_url: String,
    pub frontend_failure_url: String,
    pub admin_token: Option<String>,
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = required("SECRET_KEY")?;
        let state_secret_key = required("STATE_SECRET_KEY")?;
        if secret_key == state_secret_key {
            return Err(ConfigError::SharedSecret);
        }

        let algorithm = parse_algorithm(&optional("ALGORITHM").unwrap_or_else(|| "HS256".into()))?;

        let tokens = TokenSettings {
            secret_key,
            state_secret_key,
            algorithm,
            access_ttl: duration("ACCESS_TOKEN_EXPIRE_MINUTES", 30, Duration::try_minutes)?,
            refresh_ttl: duration("REFRESH_TOKEN_EXPIRE_DAYS", 7, Duration::try_days)?,
            state_ttl: duration("STATE_TOKEN_EXPIRE_MINUTES", 10, Duration::try_minutes)?,
        };

        let defaults = GoogleSettings::default();
        let google = GoogleSettings {
            client_id: optional("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: optional("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: optional("GOOGLE_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
            auth_url: optional("GOOGLE_AUTH_URL").unwrap_or(defaults.auth_url),
            token_url: optional("GOOGLE_TOKEN_URL").unwrap_or(defaults.token_url),
            certs_url: optional("GOOGLE_CERTS_URL").unwrap_or(defaults.certs_url),
            key_cache_lifetime: duration("GOOGLE_KEY_CACHE_SECONDS", 3600, Duration::try_seconds)?,
            http_timeout: std::time::Duration::from_secs(positive(
                "HTTP_TIMEOUT_SECONDS",
                optional("HTTP_TIMEOUT_SECONDS"),
                10,
            )? as u64),
        };

        let allowed_origins = optional("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let frontend_success_url = redirect_target(
            "FRONTEND_SUCCESS_URL",
            optional("FRONTEND_SUCCESS_URL")
                .unwrap_or_else(|| "http://localhost:3000/login-success".to_string()),
        )?;
        let frontend_failure_url = redirect_target(
            "FRONTEND_FAILURE_URL",
            optional("FRONTEND_FAILURE_URL")
                .unwrap_or_else(|| "http://localhost:3000/login-failure".to_string()),
        )?;

        Ok(Self {
            environment: optional("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            debug: optional("DEBUG")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            port: parsed("PORT", 8080)?,
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://task_api.db".to_string()),
            allowed_origins,
            tokens,
            google,
            frontend_success_url,
            frontend_failure_url,
            admin_token: optional("ADMIN_TOKEN"),
            sentry_dsn: optional("SENTRY_DSN"),
        })
    }

    /// Cookies are only marked `Secure` outside debug deployments
    pub fn secure_cookies(&self) -> bool {
        !self.debug
    }
}

/// Only the HMAC family is accepted: both secrets are symmetric.
pub fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(value.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::Invalid {
            name: "ALGORITHM",
            value: value.to_string(),
        }),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        None => Ok(default),
    }
}

/// A strictly positive integer setting
fn positive(name: &'static str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}

/// A positive span read in the unit `unit` converts from; overflow is an error
fn span(
    name: &'static str,
    raw: Option<String>,
    default: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    let value = positive(name, raw, default)?;
    unit(value).ok_or(ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn duration(
    name: &'static str,
    default: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    span(name, optional(name), default, unit)
}

/// Absolute http(s) URL usable as a `Location` header
fn redirect_target(name: &'static str, url: String) -> Result<String, ConfigError> {
    let usable = (url.starts_with("http://") || url.starts_with("https://"))
        && HeaderValue::from_str(&url).is_ok();
    if usable {
        Ok(url)
    } else {
        Err(ConfigError::Invalid { name, value: url })
    }
}

#[cfg(test)]
impl AppConfig {
    /// Configuration used across unit and router tests
    pub fn for_tests() -> Self {
        Self {
            environment: "test".to_string(),
            debug: true,
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            tokens: TokenSettings {
                secret_key: "test-account-secret".to_string(),
                state_secret_key: "test-state-secret".to_string(),
                algorithm: Algorithm::HS256,
                access_ttl: Duration::minutes(30),
                refresh_ttl: Duration::days(7),
                state_ttl: Duration::minutes(10),
            },
            google: GoogleSettings {
                client_id: "test-client.apps.googleusercontent.com".to_string(),
                client_secret: "test-client-secret".to_string(),
                ..GoogleSettings::default()
            },
            frontend_success_url: "http://localhost:3000/login-success".to_string(),
            frontend_failure_url: "http://localhost:3000/login-failure".to_string(),
            admin_token: Some("test-admin-token".to_string()),
            sentry_dsn: None,
        }
    }
}
