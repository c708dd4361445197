//! Check-in configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKIN_BASE_URL` - Public origin redemption links point at
//!   (e.g. `https://app.example.com`)
//!
//! ## Optional
//! - `CHECKIN_TOKEN_TTL_DAYS` - Token lifetime in days (default: 7, max: 365)

use chrono::TimeDelta;
use thiserror::Error;
use url::Url;

const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Token issuance configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInConfig {
    /// Origin (and optional path prefix) of the redemption page
    pub base_url: Url,
    /// How long an issued token stays redeemable
    pub token_ttl: TimeDelta,
}

impl CheckInConfig {
    /// Build a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` (keyed by the variable the value
    /// would normally come from) if the URL is not an absolute http(s) URL or
    /// the TTL is outside 1..=365 days.
    pub fn new(base_url: &str, token_ttl_days: i64) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            token_ttl: validate_ttl_days(token_ttl_days)?,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Callers that use a `.env` file should load it (e.g. with `dotenvy`)
    /// before calling this.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("CHECKIN_BASE_URL")?;

        let ttl_days = match get_optional_env("CHECKIN_TOKEN_TTL_DAYS") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                ConfigError::InvalidEnvVar("CHECKIN_TOKEN_TTL_DAYS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TOKEN_TTL_DAYS,
        };

        Self::new(&base_url, ttl_days)
    }

    /// Token lifetime in whole days.
    #[must_use]
    pub fn token_ttl_days(&self) -> i64 {
        self.token_ttl.num_days()
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse and validate the redemption base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("CHECKIN_BASE_URL".to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("URL must not carry a query or fragment".to_string()));
    }

    Ok(url)
}

/// Validate the token lifetime.
fn validate_ttl_days(days: i64) -> Result<TimeDelta, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
        return Err(ConfigError::InvalidEnvVar(
            "CHECKIN_TOKEN_TTL_DAYS".to_string(),
            format!("must be between 1 and {MAX_TOKEN_TTL_DAYS}, got {days}"),
        ));
    }

    TimeDelta::try_days(days).ok_or_else(|| {
        ConfigError::InvalidEnvVar(
            "CHECKIN_TOKEN_TTL_DAYS".to_string(),
            format!("out of range: {days}"),
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let config = CheckInConfig::new("https://app.example.com", 7).unwrap();
        assert_eq!(config.base_url.as_str(), "https://app.example.com/");
        assert_eq!(config.token_ttl_days(), 7);
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let config = CheckInConfig::new("https://example.com/app", 1).unwrap();
        assert_eq!(config.base_url.path(), "/app");
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let err = CheckInConfig::new("ftp://example.com", 7).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CHECKIN_BASE_URL"));

        assert!(CheckInConfig::new("mailto:ops@example.com", 7).is_err());
        assert!(CheckInConfig::new("not a url", 7).is_err());
    }

    #[test]
    fn test_base_url_rejects_query() {
        assert!(CheckInConfig::new("https://example.com/?a=1", 7).is_err());
        assert!(CheckInConfig::new("https://example.com/#frag", 7).is_err());
    }

    #[test]
    fn test_ttl_bounds() {
        assert!(CheckInConfig::new("https://example.com", 0).is_err());
        assert!(CheckInConfig::new("https://example.com", -3).is_err());
        assert!(CheckInConfig::new("https://example.com", 366).is_err());
        assert!(CheckInConfig::new("https://example.com", 365).is_ok());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("CHECKIN_BASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: CHECKIN_BASE_URL"
        );
    }
}
