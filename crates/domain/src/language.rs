//! Language codes and the language selection rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::I18nError;

/// A language the application ships resources for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    Ko,
    En,
}

/// Languages with bundled resources, in display order.
pub const SUPPORTED_LANGUAGES: [LanguageCode; 2] = [LanguageCode::Ko, LanguageCode::En];

/// Fallback when neither a stored nor a device language is usable.
pub const DEFAULT_LANGUAGE: LanguageCode = LanguageCode::En;

impl LanguageCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
        }
    }

    /// Parse the primary subtag of a BCP 47 locale tag (`ko-KR` → `ko`).
    #[must_use]
    pub fn from_locale_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next()?;
        primary.parse().ok()
    }

    /// The other bundled language (ko ↔ en).
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Ko => Self::En,
            Self::En => Self::Ko,
        }
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        DEFAULT_LANGUAGE
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko" => Ok(Self::Ko),
            "en" => Ok(Self::En),
            _ => Err(I18nError::UnsupportedLanguage {
                code: s.to_string(),
            }),
        }
    }
}

/// Pick the active language: stored preference, then device locale, then
/// [`DEFAULT_LANGUAGE`]. Unsupported values are skipped.
#[must_use]
pub fn resolve_language(stored: Option<&str>, device: Option<&str>) -> LanguageCode {
    stored
        .and_then(|code| code.parse().ok())
        .or_else(|| device.and_then(LanguageCode::from_locale_tag))
        .unwrap_or(DEFAULT_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_prefer_stored_language() {
        assert_eq!(resolve_language(Some("ko"), Some("en-US")), LanguageCode::Ko);
    }

    #[test]
    fn should_fall_back_to_device_language_when_stored_is_unsupported() {
        assert_eq!(resolve_language(Some("fr"), Some("ko-KR")), LanguageCode::Ko);
    }

    #[test]
    fn should_fall_back_to_default_when_nothing_matches() {
        assert_eq!(resolve_language(None, Some("de-DE")), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language(None, None), DEFAULT_LANGUAGE);
    }

    #[test]
    fn should_parse_locale_tags_with_either_separator() {
        assert_eq!(LanguageCode::from_locale_tag("ko_KR"), Some(LanguageCode::Ko));
        assert_eq!(LanguageCode::from_locale_tag("EN"), Some(LanguageCode::En));
        assert_eq!(LanguageCode::from_locale_tag(""), None);
    }

    #[test]
    fn should_reject_unsupported_code() {
        let result = "ja".parse::<LanguageCode>();
        assert!(matches!(
            result,
            Err(I18nError::UnsupportedLanguage { code }) if code == "ja"
        ));
    }

    #[test]
    fn should_toggle_between_bundled_languages() {
        assert_eq!(LanguageCode::Ko.toggled(), LanguageCode::En);
        assert_eq!(LanguageCode::En.toggled(), LanguageCode::Ko);
    }

    #[test]
    fn should_serialize_as_lowercase_code() {
        let json = serde_json::to_string(&LanguageCode::Ko).unwrap();
        assert_eq!(json, "\"ko\"");
    }
}
