//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the remote cart service
//!
//! ## Optional
//! - `CART_API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `CART_AUTH_TOKEN` - Session credential for headless consumers
//! - `CART_EMPTY_LOAD_POLICY` - `keep` or `clear` (default: keep)
//! - `CART_MUTATION_ORDERING` - `per-product` or `unordered` (default: per-product)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// What an empty initial-load result does to a non-empty local cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyLoadPolicy {
    /// Leave the local cart as it was.
    #[default]
    KeepLocal,
    /// Replace the local cart with the empty listing.
    Clear,
}

impl FromStr for EmptyLoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep-local" => Ok(Self::KeepLocal),
            "clear" => Ok(Self::Clear),
            other => Err(format!("expected `keep` or `clear`, got `{other}`")),
        }
    }
}

/// How overlapping add/remove calls for the same product are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationOrdering {
    /// Calls for one product id run one at a time, in issue order.
    #[default]
    PerProduct,
    /// Calls race at the gateway and apply in resolution order.
    Unordered,
}

impl FromStr for MutationOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-product" | "per_product" => Ok(Self::PerProduct),
            "unordered" => Ok(Self::Unordered),
            other => Err(format!(
                "expected `per-product` or `unordered`, got `{other}`"
            )),
        }
    }
}

/// Top-level cart configuration.
#[derive(Debug, Clone)]
pub struct CartsyncConfig {
    /// Remote cart service configuration
    pub gateway: GatewayConfig,
    /// Cart store behavior
    pub store: StoreOptions,
    /// Credential for headless consumers (redacted in `Debug`)
    pub auth_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Remote cart service configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL; endpoints are resolved beneath it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Cart store behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOptions {
    pub empty_load: EmptyLoadPolicy,
    pub ordering: MutationOrdering,
}

impl CartsyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the auth token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let gateway = GatewayConfig::from_env()?;
        let store = StoreOptions {
            empty_load: parse_env_or_default("CART_EMPTY_LOAD_POLICY", "keep")?,
            ordering: parse_env_or_default("CART_MUTATION_ORDERING", "per-product")?,
        };
        let auth_token = get_optional_env("CART_AUTH_TOKEN")
            .map(|token| validated_secret(token, "CART_AUTH_TOKEN"))
            .transpose()?;

        Ok(Self {
            gateway,
            store,
            auth_token,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl GatewayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("CART_API_BASE_URL")?;
        let base_url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("CART_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "CART_API_BASE_URL".to_string(),
                format!("unsupported scheme `{}`", base_url.scheme()),
            ));
        }

        let timeout_secs: u64 =
            parse_env_or_default("CART_API_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_API_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to a default representation.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    let raw = get_optional_env(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject tokens that are obviously copied from documentation.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

fn validated_secret(value: String, var_name: &str) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(value);
    validate_secret_strength(secret.expose_secret(), var_name)?;
    Ok(secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_load_policy_parse() {
        assert_eq!(
            "keep".parse::<EmptyLoadPolicy>().unwrap(),
            EmptyLoadPolicy::KeepLocal
        );
        assert_eq!(
            " Clear ".parse::<EmptyLoadPolicy>().unwrap(),
            EmptyLoadPolicy::Clear
        );
        assert!("wipe".parse::<EmptyLoadPolicy>().is_err());
    }

    #[test]
    fn test_mutation_ordering_parse() {
        assert_eq!(
            "per-product".parse::<MutationOrdering>().unwrap(),
            MutationOrdering::PerProduct
        );
        assert_eq!(
            "UNORDERED".parse::<MutationOrdering>().unwrap(),
            MutationOrdering::Unordered
        );
        assert!("fifo".parse::<MutationOrdering>().is_err());
    }

    #[test]
    fn test_store_options_default() {
        let options = StoreOptions::default();
        assert_eq!(options.empty_load, EmptyLoadPolicy::KeepLocal);
        assert_eq!(options.ordering, MutationOrdering::PerProduct);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("eyJhbGciOiJIUzI1NiJ9.c2Vzc2lvbg.k3y", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = CartsyncConfig {
            gateway: GatewayConfig {
                base_url: "https://carts.local/api".parse().unwrap(),
                timeout: Duration::from_secs(10),
            },
            store: StoreOptions::default(),
            auth_token: Some(SecretString::from("super_secret_session_token")),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("carts.local"));
        assert!(!debug_output.contains("super_secret_session_token"));
    }
}
