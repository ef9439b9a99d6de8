//! Bundled translations and a configurable device locale.

use std::collections::HashSet;
use std::future::Future;

use lifeline_app::ports::LocaleSource;
use lifeline_domain::error::LifelineError;
use lifeline_domain::language::LanguageCode;

const EN: &str = include_str!("../resources/en.json");
const KO: &str = include_str!("../resources/ko.json");

/// Locale source backed by the translation files compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct StaticLocaleSource {
    device: Option<String>,
    missing: HashSet<LanguageCode>,
}

impl StaticLocaleSource {
    /// `device` is the locale tag the device reports (e.g. `"ko-KR"`).
    pub fn new(device: Option<impl Into<String>>) -> Self {
        Self {
            device: device.map(Into::into),
            missing: HashSet::new(),
        }
    }

    /// Pretend the bundle for `language` is absent.
    #[must_use]
    pub fn without(mut self, language: LanguageCode) -> Self {
        self.missing.insert(language);
        self
    }
}

impl LocaleSource for StaticLocaleSource {
    fn device_language(&self) -> Option<String> {
        self.device.clone()
    }

    fn load_resources(
        &self,
        language: LanguageCode,
    ) -> impl Future<Output = Result<serde_json::Value, LifelineError>> + Send {
        let result = if self.missing.contains(&language) {
            Err(LifelineError::storage(format!(
                "language file not found: {language}.json"
            )))
        } else {
            let raw = match language {
                LanguageCode::En => EN,
                LanguageCode::Ko => KO,
            };
            serde_json::from_str(raw).map_err(LifelineError::from)
        };
        async { result }
    }
}
