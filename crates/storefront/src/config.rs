//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `NEXUS_API_BASE_URL` - Catalog API base (default: `https://alx-project-nexus-psi.vercel.app/api/v1`)
//! - `NEXUS_AUTH_BASE_URL` - Auth API base (default: `<api base>/auth`)
//! - `NEXUS_STATE_DIR` - Directory for persisted client state (default: `.nexus`)
//! - `NEXUS_MAX_PAGES` - Page ceiling for catalog aggregation (default: 1000)
//! - `NEXUS_HTTP_TIMEOUT_SECS` - Per-request HTTP timeout (default: 30)
//! - `NEXUS_CACHE_TTL_SECS` - Product detail cache TTL (default: 300)
//! - `NEXUS_LOG_JSON` - Emit JSON logs when `true` or `1`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::catalog::DEFAULT_MAX_PAGES;

/// Default catalog API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://alx-project-nexus-psi.vercel.app/api/v1";

const DEFAULT_STATE_DIR: &str = ".nexus";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Catalog API configuration
    pub catalog: CatalogConfig,
    /// Auth API configuration
    pub auth: AuthConfig,
    /// Directory backing the file store
    pub state_dir: PathBuf,
    /// Logging and error tracking
    pub telemetry: TelemetryConfig,
}

/// Catalog API configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL the `products/` and `categories/` endpoints hang off
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product details stay cached
    pub cache_ttl: Duration,
    /// Aggregation page ceiling
    pub max_pages: u32,
}

/// Auth API configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL the `register/`, `login/` and `logout/` endpoints hang off
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Logging and error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let api_base = env.url_or_default("NEXUS_API_BASE_URL", DEFAULT_API_BASE_URL)?;
        let auth_base = match env.optional("NEXUS_AUTH_BASE_URL") {
            Some(value) => parse_url("NEXUS_AUTH_BASE_URL", &value)?,
            None => default_auth_base(&api_base),
        };

        let timeout = Duration::from_secs(
            env.parsed_or_default("NEXUS_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        );
        let cache_ttl = Duration::from_secs(
            env.parsed_or_default("NEXUS_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
        );
        let max_pages = env.parsed_or_default("NEXUS_MAX_PAGES", DEFAULT_MAX_PAGES)?;
        if max_pages == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "NEXUS_MAX_PAGES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            catalog: CatalogConfig {
                base_url: api_base,
                timeout,
                cache_ttl,
                max_pages,
            },
            auth: AuthConfig {
                base_url: auth_base,
                timeout,
            },
            state_dir: PathBuf::from(env.or_default("NEXUS_STATE_DIR", DEFAULT_STATE_DIR)),
            telemetry: TelemetryConfig {
                sentry_dsn: env.optional("SENTRY_DSN"),
                sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
                log_json: env.flag("NEXUS_LOG_JSON"),
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the typed accessors used by [`StorefrontConfig`].
struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a URL variable, falling back to `default` when unset.
    fn url_or_default(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        parse_url(key, &self.or_default(key, default))
    }

    /// Whether a boolean flag is set to `true` or `1`.
    fn flag(&self, key: &str) -> bool {
        self.optional(key)
            .is_some_and(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true"))
    }
}

/// Parse and validate an HTTP(S) base URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

/// `<api base>/auth`.
fn default_auth_base(api_base: &Url) -> Url {
    let mut url = api_base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("auth");
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.catalog.base_url.as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(
            config.auth.base_url.as_str(),
            "https://alx-project-nexus-psi.vercel.app/api/v1/auth"
        );
        assert_eq!(config.state_dir, PathBuf::from(".nexus"));
        assert_eq!(config.catalog.max_pages, 1000);
        assert_eq!(config.catalog.timeout, Duration::from_secs(30));
        assert_eq!(config.catalog.cache_ttl, Duration::from_secs(300));
        assert!(config.telemetry.sentry_dsn.is_none());
        assert!(!config.telemetry.log_json);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("NEXUS_API_BASE_URL", "http://localhost:8000/api/v1/"),
            ("NEXUS_AUTH_BASE_URL", "http://localhost:8001/auth"),
            ("NEXUS_STATE_DIR", "/tmp/nexus"),
            ("NEXUS_MAX_PAGES", "5"),
            ("NEXUS_HTTP_TIMEOUT_SECS", "3"),
            ("NEXUS_LOG_JSON", "TRUE"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ])
        .unwrap();
        assert_eq!(config.catalog.base_url.as_str(), "http://localhost:8000/api/v1/");
        assert_eq!(config.auth.base_url.as_str(), "http://localhost:8001/auth");
        assert_eq!(config.auth.timeout, Duration::from_secs(3));
        assert_eq!(config.state_dir, PathBuf::from("/tmp/nexus"));
        assert_eq!(config.catalog.max_pages, 5);
        assert!(config.telemetry.log_json);
        assert!(config.telemetry.sentry_dsn.is_some());
    }

    #[test]
    fn test_auth_base_follows_api_base_with_trailing_slash() {
        let config = load(&[("NEXUS_API_BASE_URL", "http://localhost:8000/api/v1/")]).unwrap();
        assert_eq!(
            config.auth.base_url.as_str(),
            "http://localhost:8000/api/v1/auth"
        );
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("NEXUS_MAX_PAGES", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.catalog.max_pages, 1000);
        assert!(config.telemetry.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[("NEXUS_MAX_PAGES", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "NEXUS_MAX_PAGES"));
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        assert!(load(&[("NEXUS_MAX_PAGES", "0")]).is_err());
    }

    #[test]
    fn test_invalid_url() {
        let err = load(&[("NEXUS_API_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));

        let err = load(&[("NEXUS_AUTH_BASE_URL", "ftp://example.com/auth")]).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }
}
