//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_BASE_URL` - Remote catalog service (default: <https://dummyjson.com>)
//! - `CATALOG_TIMEOUT_SECS` - HTTP timeout for catalog calls (default: 30)
//! - `CATALOG_PAGE_LIMIT` - Page size for the product listing (default: service default)
//! - `CART_USER_ID` - Identity the remote cart is kept under (default: 1)
//! - `CART_STORE_PATH` - Local cart file (default: .amber-market/cart.json; empty disables)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use amber_market_core::UserId;
use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_BASE_URL: &str = "https://dummyjson.com";
const DEFAULT_CART_STORE_PATH: &str = ".amber-market/cart.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Remote catalog service
    pub catalog: CatalogConfig,
    /// Cart identity and local persistence
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Remote catalog service configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL every endpoint path is joined to
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Page size for the product listing; `None` uses the service default
    pub page_limit: Option<u32>,
}

/// Cart configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Fixed identity the remote cart is scoped by
    pub user_id: UserId,
    /// Local cart file; `None` disables local persistence
    pub store_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            page_limit: None,
        }
    }
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

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("STOREFRONT_PORT", 3000_u16)?;

        let base_url = env.get_or("CATALOG_BASE_URL", DEFAULT_CATALOG_BASE_URL);
        validate_base_url(&base_url)?;
        let timeout_secs = env.parse_or("CATALOG_TIMEOUT_SECS", 30_u64)?;
        if timeout_secs == 0 {
            return Err(invalid("CATALOG_TIMEOUT_SECS", "must be at least 1"));
        }
        let page_limit = env.parse_optional::<u32>("CATALOG_PAGE_LIMIT")?;

        let user_id = env.parse_or("CART_USER_ID", UserId::new(1))?;
        if !user_id.is_assigned() {
            return Err(invalid("CART_USER_ID", "must be a positive integer"));
        }
        let store_path = match env.get("CART_STORE_PATH") {
            None => Some(PathBuf::from(DEFAULT_CART_STORE_PATH)),
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
        };

        Ok(Self {
            host,
            port,
            catalog: CatalogConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                page_limit,
            },
            cart: CartConfig {
                user_id,
                store_path,
            },
            sentry_dsn: env.get_non_empty("SENTRY_DSN"),
            sentry_environment: env.get_non_empty("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get_non_empty(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_non_empty(key)
            .map(|v| v.trim().parse::<T>().map_err(|e| invalid(key, e)))
            .transpose()
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse_optional(key)?.unwrap_or(default))
    }
}

fn invalid(key: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason.to_string())
}

/// The catalog URL must be absolute http(s).
fn validate_base_url(value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid("CATALOG_BASE_URL", e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "CATALOG_BASE_URL",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
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

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.catalog.base_url, "https://dummyjson.com");
        assert_eq!(config.catalog.timeout, Duration::from_secs(30));
        assert_eq!(config.catalog.page_limit, None);
        assert_eq!(config.cart.user_id, UserId::new(1));
        assert_eq!(
            config.cart.store_path.as_deref(),
            Some(std::path::Path::new(".amber-market/cart.json"))
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "8080"),
            ("CATALOG_BASE_URL", "http://localhost:9000/api"),
            ("CATALOG_TIMEOUT_SECS", "5"),
            ("CATALOG_PAGE_LIMIT", "0"),
            ("CART_USER_ID", "7"),
            ("CART_STORE_PATH", "/tmp/cart.json"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.catalog.base_url, "http://localhost:9000/api");
        assert_eq!(config.catalog.timeout, Duration::from_secs(5));
        assert_eq!(config.catalog.page_limit, Some(0));
        assert_eq!(config.cart.user_id, UserId::new(7));
        assert_eq!(
            config.cart.store_path,
            Some(PathBuf::from("/tmp/cart.json"))
        );
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_empty_store_path_disables_persistence() {
        let config = load(&[("CART_STORE_PATH", "")]).unwrap();
        assert!(config.cart.store_path.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("STOREFRONT_PORT", "http"),
            ("STOREFRONT_HOST", "localhost"),
            ("CATALOG_BASE_URL", "not a url"),
            ("CATALOG_BASE_URL", "ftp://dummyjson.com"),
            ("CATALOG_TIMEOUT_SECS", "0"),
            ("CART_USER_ID", "0"),
            ("CART_USER_ID", "abc"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidEnvVar(k, _) if k == key),
                "{key}={value} gave {err}"
            );
        }
    }
}
