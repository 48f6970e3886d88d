//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QKART_BACKEND_URL` - Base URL of the remote service (e.g., `http://localhost:8082/api/v1`)
//!
//! ## Optional
//! - `QKART_SESSION_PATH` - Session file location (default: `.qkart-session.json`)
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search input quiet period (default: 500)
//! - `QKART_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime, 0 disables (default: 300)
//! - `QKART_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_SESSION_PATH: &str = ".qkart-session.json";
const DEFAULT_SEARCH_DEBOUNCE_MS: &str = "500";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote service connection settings
    pub backend: BackendConfig,
    /// Where the session (token, username, balance) is persisted
    pub session_path: PathBuf,
    /// Quiet period before a search request is issued
    pub search_debounce: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Remote service connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL all API paths are joined onto
    pub endpoint: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long the product list is cached (`Duration::ZERO` disables)
    pub catalog_cache_ttl: Duration,
}

impl BackendConfig {
    /// Settings for a backend at `endpoint` with default timeout and caching.
    #[must_use]
    pub const fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(30),
            catalog_cache_ttl: Duration::from_secs(300),
        }
    }

    /// Disable catalog caching.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.catalog_cache_ttl = Duration::ZERO;
        self
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let endpoint = parse_endpoint(&get_required_env("QKART_BACKEND_URL")?)?;
        let timeout = Duration::from_secs(parse_env(
            "QKART_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let catalog_cache_ttl = Duration::from_secs(parse_env(
            "QKART_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?);
        let search_debounce = Duration::from_millis(parse_env(
            "QKART_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_DEBOUNCE_MS,
        )?);
        let session_path =
            PathBuf::from(get_env_or_default("QKART_SESSION_PATH", DEFAULT_SESSION_PATH));

        Ok(Self {
            backend: BackendConfig {
                endpoint,
                timeout,
                catalog_cache_ttl,
            },
            session_path,
            search_debounce,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the backend URL, forcing a trailing slash so relative joins keep
/// any path prefix (`/api/v1` + `products` -> `/api/v1/products`).
fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("QKART_BACKEND_URL".to_string(), msg);

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
