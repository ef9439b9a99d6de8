//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `lifeline.toml` in the working directory (or the path in
//! `LIFELINE_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use lifeline_domain::ads::{AdUnitIds, AdsEnvironment};
use lifeline_domain::error::ValidationError;
use lifeline_domain::flags::FlagMap;
use lifeline_domain::http::{API_BASE_URL, HTTP_TIMEOUT, HttpConfig};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Backend client settings.
    pub http: HttpSection,
    /// Ads SDK settings.
    pub ads: AdsSection,
    /// Device locale settings.
    pub locale: LocaleSection,
    /// What to do with the initialization report.
    pub startup: StartupConfig,
    /// Built-in feature flag defaults.
    pub flags: FlagMap,
    /// Knobs of the virtual adapters.
    pub demo: DemoConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdsSection {
    pub environment: AdsEnvironment,
    /// Ad units served in production; required when `environment = "production"`.
    pub units: Option<AdUnitIds>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocaleSection {
    /// Locale tag reported as the device language (e.g. `ko-KR`).
    pub device: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub on_failure: FailurePolicy,
}

/// Behaviour of the virtual adapters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulate a device without connectivity.
    pub offline: bool,
    /// Make the ads SDK fail to start with this message.
    pub ads_failure: Option<String>,
}

/// Reaction to services that failed to initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep running with the failed services unavailable.
    #[default]
    Degrade,
    /// Stop the process.
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "abort" => Ok(Self::Abort),
            _ => Err(ValidationError::UnknownValue {
                field: "startup.on_failure",
                value: s.to_string(),
            }),
        }
    }
}

impl Config {
    /// Load configuration from `lifeline.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// override cannot be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LIFELINE_CONFIG").unwrap_or_else(|_| "lifeline.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = var("LIFELINE_HTTP_BASE_URL") {
            self.http.base_url = val;
        }
        if let Some(val) = var("LIFELINE_HTTP_TIMEOUT_MS") {
            self.http.timeout_ms = val.parse().map_err(|_| ValidationError::UnknownValue {
                field: "http.timeout_ms",
                value: val.clone(),
            })?;
        }
        if let Some(val) = var("LIFELINE_ADS_ENVIRONMENT") {
            self.ads.environment = val.parse()?;
        }
        if let Some(val) = var("LIFELINE_ON_FAILURE") {
            self.startup.on_failure = val.parse()?;
        }
        if let Some(val) = var("LIFELINE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.http_config().validate()?;
        if self.ads.environment == AdsEnvironment::Production && self.ads.units.is_none() {
            return Err(ValidationError::EmptyField { field: "ads.units" }.into());
        }
        Ok(())
    }

    /// Client configuration for the HTTP service.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.http.base_url.clone(),
            timeout: Duration::from_millis(self.http.timeout_ms),
            ..HttpConfig::default()
        }
    }

    /// Ad units to hand to the ads service; test units outside production.
    #[must_use]
    pub fn production_ad_units(&self) -> AdUnitIds {
        self.ads.units.clone().unwrap_or_else(AdUnitIds::test)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lifelined=info,lifeline_app=info".to_string(),
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            timeout_ms: u64::try_from(HTTP_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration")]
    Validation(#[from] ValidationError),
}
