//! Ad unit identifiers and SDK request configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Ad unit ids for every format the application shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdUnitIds {
    pub banner: String,
    pub interstitial: String,
    pub rewarded: String,
    pub rewarded_interstitial: String,
    pub app_open: String,
}

impl AdUnitIds {
    /// Publisher test units; safe to load from any build.
    #[must_use]
    pub fn test() -> Self {
        Self {
            banner: "ca-app-pub-3940256099942544/6300978111".to_string(),
            interstitial: "ca-app-pub-3940256099942544/1033173712".to_string(),
            rewarded: "ca-app-pub-3940256099942544/5224354917".to_string(),
            rewarded_interstitial: "ca-app-pub-3940256099942544/5354046379".to_string(),
            app_open: "ca-app-pub-3940256099942544/9257395921".to_string(),
        }
    }
}

/// Which set of ad units to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdsEnvironment {
    #[default]
    Test,
    Production,
}

impl FromStr for AdsEnvironment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "test" | "development" | "dev" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ValidationError::UnknownValue {
                field: "ads.environment",
                value: s.to_string(),
            }),
        }
    }
}

/// Maximum content rating of served ads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaxAdContentRating {
    G,
    #[default]
    Pg,
    T,
    Ma,
}

/// Request configuration applied once the SDK is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfiguration {
    pub max_ad_content_rating: MaxAdContentRating,
    pub tag_for_child_directed_treatment: bool,
    pub tag_for_under_age_of_consent: bool,
    pub test_device_identifiers: Vec<String>,
}

impl Default for RequestConfiguration {
    fn default() -> Self {
        Self {
            max_ad_content_rating: MaxAdContentRating::Pg,
            tag_for_child_directed_treatment: false,
            tag_for_under_age_of_consent: false,
            test_device_identifiers: vec!["EMULATOR".to_string()],
        }
    }
}

/// Per-mediation-adapter status reported by the SDK on initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterStatus {
    pub name: String,
    pub ready: bool,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_pg_rating_and_emulator_test_device() {
        let config = RequestConfiguration::default();
        assert_eq!(config.max_ad_content_rating, MaxAdContentRating::Pg);
        assert!(!config.tag_for_child_directed_treatment);
        assert_eq!(config.test_device_identifiers, vec!["EMULATOR"]);
    }

    #[test]
    fn should_parse_environment_aliases() {
        assert_eq!("prod".parse::<AdsEnvironment>().unwrap(), AdsEnvironment::Production);
        assert_eq!("Development".parse::<AdsEnvironment>().unwrap(), AdsEnvironment::Test);
        assert!("staging".parse::<AdsEnvironment>().is_err());
    }

    #[test]
    fn should_use_publisher_test_units() {
        let ids = AdUnitIds::test();
        assert!(ids.banner.starts_with("ca-app-pub-3940256099942544/"));
    }
}
