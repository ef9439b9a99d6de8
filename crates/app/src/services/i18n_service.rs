//! I18n service: active language selection and translation lookup.
//!
//! The active language is chosen once at startup (stored preference, then
//! device locale, then the default language) and can be changed afterwards.
//! Resource bundles are nested JSON objects addressed with dotted keys
//! (`"home.title"`); values may contain `{{name}}` placeholders.
//!
//! Failures never fail initialization: they are published on the error
//! channel, which consumers watch to show a fallback UI.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use lifeline_domain::error::{I18nError, LifelineError};
use lifeline_domain::language::{
    DEFAULT_LANGUAGE, LanguageCode, SUPPORTED_LANGUAGES, resolve_language,
};

use crate::notifier::Subscription;
use crate::observable::Observable;
use crate::ports::{Initializable, KeyValueStore, LocaleSource};

pub const LANGUAGE_KEY: &str = "language";

pub struct I18nService<S, L> {
    store: S,
    locale: L,
    current_language: Observable<LanguageCode>,
    is_loaded: Observable<bool>,
    error: Observable<Option<String>>,
    resources: Mutex<HashMap<LanguageCode, serde_json::Value>>,
}

impl<S, L> I18nService<S, L>
where
    S: KeyValueStore + Send + Sync,
    L: LocaleSource + Send + Sync,
{
    pub fn new(store: S, locale: L) -> Self {
        Self {
            store,
            locale,
            current_language: Observable::new("current_language", DEFAULT_LANGUAGE),
            is_loaded: Observable::new("is_loaded", false),
            error: Observable::new("i18n_error", None),
            resources: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn current_language(&self) -> LanguageCode {
        self.current_language.get()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.is_loaded.get()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.error.get()
    }

    #[must_use]
    pub fn supported_languages(&self) -> &'static [LanguageCode] {
        &SUPPORTED_LANGUAGES
    }

    #[must_use]
    pub fn is_language_supported(&self, code: &str) -> bool {
        code.parse::<LanguageCode>().is_ok()
    }

    pub fn on_language_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&LanguageCode) + Send + Sync + 'static,
    {
        self.current_language.subscribe(listener)
    }

    pub fn on_load_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.is_loaded.subscribe(listener)
    }

    pub fn on_error_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Option<String>) + Send + Sync + 'static,
    {
        self.error.subscribe(listener)
    }

    /// Switch to `code`, loading its resources and persisting the choice.
    ///
    /// Any failure is also published on the error channel.
    ///
    /// # Errors
    ///
    /// [`I18nError::UnsupportedLanguage`] for an unknown code,
    /// [`I18nError::ResourceLoad`] when the bundle cannot be loaded, or a
    /// storage error when the choice cannot be persisted.
    pub async fn change_language(&self, code: &str) -> Result<LanguageCode, LifelineError> {
        self.error.set(None);
        match self.switch_to(code).await {
            Ok(language) => Ok(language),
            Err(err) => {
                tracing::warn!(code, error = %err.display_chain(), "language change failed");
                self.error.set(Some(err.display_chain()));
                Err(err)
            }
        }
    }

    /// Switch between the two bundled languages.
    ///
    /// # Errors
    ///
    /// See [`change_language`](Self::change_language).
    pub async fn toggle_language(&self) -> Result<LanguageCode, LifelineError> {
        let next = self.current_language().toggled();
        self.change_language(next.as_str()).await
    }

    /// Translate `key` in the active language.
    ///
    /// Falls back to the default language, then to the key itself.
    #[must_use]
    pub fn translate(&self, key: &str) -> String {
        self.translate_with(key, &[])
    }

    /// Translate `key`, replacing each `{{name}}` with its value in `params`.
    #[must_use]
    pub fn translate_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let current = self.current_language();
        let resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
        let template = [current, DEFAULT_LANGUAGE]
            .iter()
            .find_map(|language| lookup(resources.get(language)?, key))
            .map(str::to_string);
        drop(resources);
        match template {
            Some(template) => interpolate(&template, params),
            None => key.to_string(),
        }
    }

    async fn switch_to(&self, code: &str) -> Result<LanguageCode, LifelineError> {
        let language: LanguageCode = code.parse()?;
        self.load(language).await?;
        self.current_language.set(language);
        tracing::info!(%language, "language changed");
        Ok(language)
    }

    /// Fetch the bundle for `language` and persist it as the preference.
    async fn load(&self, language: LanguageCode) -> Result<(), LifelineError> {
        self.fetch(language).await?;
        self.store
            .set(LANGUAGE_KEY, language.as_str().to_string())
            .await
    }

    async fn fetch(&self, language: LanguageCode) -> Result<(), LifelineError> {
        let bundle = self
            .locale
            .load_resources(language)
            .await
            .map_err(|source| I18nError::ResourceLoad {
                language,
                source: Box::new(source),
            })?;
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language, bundle);
        Ok(())
    }

    async fn bootstrap(&self) -> Result<LanguageCode, LifelineError> {
        let stored = match self.store.get(LANGUAGE_KEY).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "stored language unavailable");
                None
            }
        };
        let device = self.locale.device_language();
        let language = resolve_language(stored.as_deref(), device.as_deref());
        tracing::debug!(?stored, ?device, %language, "language resolved");

        self.load(language).await?;
        if language != DEFAULT_LANGUAGE {
            // Fallback bundle; translation degrades to keys without it.
            if let Err(err) = self.fetch(DEFAULT_LANGUAGE).await {
                tracing::warn!(error = %err, "fallback language bundle unavailable");
            }
        }
        Ok(language)
    }
}

#[async_trait]
impl<S, L> Initializable for I18nService<S, L>
where
    S: KeyValueStore + Send + Sync,
    L: LocaleSource + Send + Sync,
{
    fn name(&self) -> &'static str {
        "i18n"
    }

    async fn initialize(&self) -> Result<(), LifelineError> {
        self.is_loaded.set(false);
        self.error.set(None);

        match self.bootstrap().await {
            Ok(language) => {
                self.current_language.set(language);
                self.is_loaded.set(true);
                tracing::info!(%language, "translations loaded");
            }
            Err(err) => {
                tracing::warn!(error = %err.display_chain(), "translations unavailable");
                self.error.set(Some(err.display_chain()));
            }
        }
        Ok(())
    }
}

fn lookup<'a>(bundle: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    key.split('.')
        .try_fold(bundle, |node, segment| node.get(segment))?
        .as_str()
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let name = rest[start + 2..start + 2 + len].trim();
        out.push_str(&rest[..start]);
        match params.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + len + 4]),
        }
        rest = &rest[start + len + 4..];
    }
    out.push_str(rest);
    out
}
