//! Locale port: device language and translation resources.

use std::future::Future;

use lifeline_domain::error::LifelineError;
use lifeline_domain::language::LanguageCode;

/// Where language information comes from.
pub trait LocaleSource {
    /// Preferred locale tag of the device (e.g. `"ko-KR"`), if known.
    fn device_language(&self) -> Option<String>;

    /// Load the translation bundle for `language` as a JSON object.
    fn load_resources(
        &self,
        language: LanguageCode,
    ) -> impl Future<Output = Result<serde_json::Value, LifelineError>> + Send;
}

impl<T: LocaleSource + Send + Sync> LocaleSource for std::sync::Arc<T> {
    fn device_language(&self) -> Option<String> {
        (**self).device_language()
    }

    fn load_resources(
        &self,
        language: LanguageCode,
    ) -> impl Future<Output = Result<serde_json::Value, LifelineError>> + Send {
        (**self).load_resources(language)
    }
}
