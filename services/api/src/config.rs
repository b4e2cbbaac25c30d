//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub cors_origin: String,
    /// Base URL of the web client, used for checkout redirects.
    pub client_url: String,
    /// Directory holding the built single-page client, served as a fallback.
    pub client_dist_path: Option<PathBuf>,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    pub checkout_currency: String,
    pub media_bucket: String,
    pub media_public_base_url: String,
    pub media_endpoint_url: Option<String>,
    /// Outbound call timeout and the inbound limit for ordinary requests.
    pub http_timeout: Duration,
    /// Inbound limit for the multipart upload routes.
    pub upload_timeout: Duration,
    pub max_upload_bytes: usize,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(name, default);
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address = parsed::<SocketAddr>("BIND_ADDRESS", "0.0.0.0:8080")?;
        let database_url = required("DATABASE_URL")?;

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Auth ---
        let jwt_secret = required("JWT_SECRET")?;
        let token_ttl_days = parsed::<i64>("TOKEN_TTL_DAYS", "1")?;
        if token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_DAYS".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Client ---
        let cors_origin = or_default("CORS_ORIGIN", "http://localhost:5173");
        let client_url = or_default("CLIENT_URL", "http://localhost:5173");
        let client_dist_path = std::env::var("CLIENT_DIST_PATH").ok().map(PathBuf::from);

        // --- Payment provider ---
        let stripe_secret_key = required("STRIPE_SECRET_KEY")?;
        let stripe_webhook_secret = required("STRIPE_WEBHOOK_SECRET")?;
        let stripe_api_base = or_default("STRIPE_API_BASE", "https://api.stripe.com");
        let checkout_currency = or_default("CHECKOUT_CURRENCY", "inr");

        // --- Media store ---
        let media_bucket = required("MEDIA_BUCKET")?;
        let media_public_base_url = required("MEDIA_PUBLIC_BASE_URL")?;
        let media_endpoint_url = std::env::var("MEDIA_ENDPOINT_URL").ok();

        // --- Limits ---
        let http_timeout = Duration::from_secs(parsed::<u64>("HTTP_TIMEOUT_SECS", "30")?);
        let upload_timeout = Duration::from_secs(parsed::<u64>("UPLOAD_TIMEOUT_SECS", "600")?);
        let max_upload_bytes = parsed::<usize>("MAX_UPLOAD_BYTES", "209715200")?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            token_ttl_days,
            cors_origin,
            client_url,
            client_dist_path,
            stripe_secret_key,
            stripe_webhook_secret,
            stripe_api_base,
            checkout_currency,
            media_bucket,
            media_public_base_url,
            media_endpoint_url,
            http_timeout,
            upload_timeout,
            max_upload_bytes,
        })
    }
}
