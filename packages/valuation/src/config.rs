//! Service configuration.
//!
//! Endpoints and the retry policy are described by a TOML document. The
//! defaults in `services.toml` are embedded at compile time; a user file
//! may replace them, and single endpoints can be overridden from the
//! environment.

use std::path::Path;
use std::time::Duration;

use fire_threat_http::RetryPolicy;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_SERVICES_TOML: &str = include_str!("../services.toml");

/// Overrides the region resolver base URL.
pub const REGION_URL_ENV: &str = "FIRE_THREAT_REGION_URL";
/// Overrides the settlement discovery base URL.
pub const OVERPASS_URL_ENV: &str = "FIRE_THREAT_OVERPASS_URL";
/// Overrides the place lookup base URL.
pub const PLACE_URL_ENV: &str = "FIRE_THREAT_PLACE_URL";

/// Errors from loading service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Configuration for all external services.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Reverse geocoder resolving coordinates to regions.
    pub region_resolver: EndpointConfig,
    /// Point-of-interest index used to discover settlements.
    pub settlement_discovery: DiscoveryConfig,
    /// Reverse geocoder producing display names.
    pub place_lookup: PlaceLookupConfig,
    /// Retry and timeout policy shared by all services.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// A plain service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the service.
    pub base_url: String,
}

/// Settlement discovery endpoint and search radius.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveryConfig {
    /// Overpass interpreter URL.
    pub base_url: String,
    /// Search radius in meters.
    #[serde(default = "default_radius_m")]
    pub radius_m: u32,
}

/// Place lookup endpoint and the credential it needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaceLookupConfig {
    /// `LocationIQ` reverse endpoint.
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

/// Retry policy as written in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_radius_m() -> u32 {
    fire_threat_settlement::DEFAULT_RADIUS_M
}

fn default_key_env() -> String {
    fire_threat_region::locationiq::DEFAULT_KEY_ENV.to_string()
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_base_delay_ms() -> u64 {
    1_000
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RetryConfig {
    /// Converts to the policy used by the HTTP layer.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl ServiceConfig {
    /// The compiled-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded document is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_SERVICES_TOML)
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Applies endpoint overrides from `lookup` (normally the process
    /// environment). Empty values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(REGION_URL_ENV) {
            log::debug!("Region resolver URL overridden by {REGION_URL_ENV}");
            self.region_resolver.base_url = url;
        }
        if let Some(url) = lookup(OVERPASS_URL_ENV) {
            log::debug!("Settlement discovery URL overridden by {OVERPASS_URL_ENV}");
            self.settlement_discovery.base_url = url;
        }
        if let Some(url) = lookup(PLACE_URL_ENV) {
            log::debug!("Place lookup URL overridden by {PLACE_URL_ENV}");
            self.place_lookup.base_url = url;
        }

        self
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Retry policy for all services.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let config = ServiceConfig::embedded().unwrap();
        assert_eq!(
            config.region_resolver.base_url,
            fire_threat_region::fcc::DEFAULT_BASE_URL
        );
        assert_eq!(
            config.settlement_discovery.base_url,
            fire_threat_settlement::overpass::DEFAULT_BASE_URL
        );
        assert_eq!(config.settlement_discovery.radius_m, 5_000);
        assert_eq!(config.place_lookup.key_env, "LOCATIONIQ_KEY");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn retry_section_is_optional() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [region_resolver]
            base_url = "http://localhost:8001/find"

            [settlement_discovery]
            base_url = "http://localhost:8002/interpreter"

            [place_lookup]
            base_url = "http://localhost:8003/reverse"
            "#,
        )
        .unwrap();
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.settlement_discovery.radius_m, 5_000);
    }

    #[test]
    fn applies_overrides() {
        let config = ServiceConfig::embedded()
            .unwrap()
            .with_overrides(|key| match key {
                OVERPASS_URL_ENV => Some("http://localhost:12345/api/interpreter".to_string()),
                REGION_URL_ENV => Some("   ".to_string()),
                _ => None,
            });

        assert_eq!(
            config.settlement_discovery.base_url,
            "http://localhost:12345/api/interpreter"
        );
        assert_eq!(
            config.region_resolver.base_url,
            fire_threat_region::fcc::DEFAULT_BASE_URL
        );
    }

    #[test]
    fn rejects_missing_sections() {
        assert!(matches!(
            ServiceConfig::from_toml_str("[retry]\nmax_retries = 1\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            ServiceConfig::from_path(Path::new("/nonexistent/services.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
