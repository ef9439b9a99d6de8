//! Common error types used across the workspace.
//!
//! Each concern gets its own typed error; everything converges into
//! [`LifelineError`] through `#[from]` so `?` works across layers.

use std::error::Error as StdError;
use std::sync::Arc;

use crate::language::LanguageCode;

/// Root error of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum LifelineError {
    #[error("singleton registry error")]
    Registry(#[from] RegistryError),

    #[error("service initialization failed")]
    Initialization(#[from] InitializationError),

    #[error("listener failed during broadcast")]
    Listener(#[from] ListenerError),

    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("http error")]
    Http(#[from] HttpError),

    #[error("authentication error")]
    Auth(#[from] AuthError),

    #[error("i18n error")]
    I18n(#[from] I18nError),

    #[error("ads error")]
    Ads(#[from] AdsError),

    /// Persisted-storage failure reported by a storage adapter.
    #[error("storage error")]
    Storage(#[source] Box<dyn StdError + Send + Sync>),

    #[error("serialization error")]
    Serialization(#[from] serde_json::Error),

    /// `initialize()` panicked instead of returning.
    #[error("service panicked during initialization")]
    Panicked,
}

impl LifelineError {
    /// Wrap any adapter error as a storage failure.
    pub fn storage(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }

    /// Message of the innermost error in the `source()` chain.
    #[must_use]
    pub fn root_cause(&self) -> String {
        let mut current: &dyn StdError = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current.to_string()
    }

    /// Every message of the `source()` chain joined with `": "`.
    #[must_use]
    pub fn display_chain(&self) -> String {
        let mut message = self.to_string();
        let mut current: &dyn StdError = self;
        while let Some(next) = current.source() {
            message.push_str(": ");
            message.push_str(&next.to_string());
            current = next;
        }
        message
    }
}

/// Failures of the singleton registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A factory transitively requested its own, not yet constructed, type.
    #[error("re-entrant construction of `{type_name}`")]
    ReentrantConstruction { type_name: &'static str },

    /// `get_instance` was called for a type nobody provided a factory for.
    #[error("no factory provided for `{type_name}`")]
    MissingFactory { type_name: &'static str },

    /// The cached value does not downcast to the requested type.
    #[error("cached instance of `{type_name}` has an unexpected type")]
    TypeMismatch { type_name: &'static str },
}

/// A registered service's `initialize()` returned an error.
///
/// Captured by the mediator and stored in the report; never returned from a
/// batch run. Cheap to clone so the same failure can appear in several reports.
#[derive(Debug, Clone, thiserror::Error)]
#[error("service `{service}` failed to initialize")]
pub struct InitializationError {
    pub service: &'static str,
    #[source]
    pub source: Arc<LifelineError>,
}

impl InitializationError {
    #[must_use]
    pub fn new(service: &'static str, source: LifelineError) -> Self {
        Self {
            service,
            source: Arc::new(source),
        }
    }

    /// Message of the innermost cause.
    #[must_use]
    pub fn root_cause(&self) -> String {
        self.source.root_cause()
    }
}

/// A subscriber panicked while a channel was broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("listener on channel `{channel}` panicked: {message}")]
pub struct ListenerError {
    pub channel: &'static str,
    pub message: String,
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("`{field}` must not be empty")]
    EmptyField { field: &'static str },

    #[error("`{url}` is not an http(s) url")]
    InvalidUrl { url: String },

    #[error("`{field}` must be non-zero")]
    ZeroDuration { field: &'static str },

    #[error("`{value}` is not a valid value for `{field}`")]
    UnknownValue { field: &'static str, value: String },
}

/// Errors surfaced by the HTTP client service.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// No response within the configured timeout.
    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The request never reached the server.
    #[error("network error: {message}")]
    Network { message: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response body")]
    Decode(#[source] serde_json::Error),
}

impl HttpError {
    /// HTTP status carried by this error, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Timeout { .. } | Self::Network { .. } | Self::Decode(_) => None,
        }
    }

    /// Whether the request never got an answer (offline, timeout).
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network { .. })
    }
}

/// Authentication failures as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("the email or password is incorrect")]
    InvalidCredentials,

    #[error("a network error occurred, please try again")]
    Network,

    #[error("the user is not authenticated")]
    Unauthorized,

    #[error("an unknown error occurred: {message}")]
    Unknown { message: String },
}

/// Language selection and resource loading failures.
#[derive(Debug, thiserror::Error)]
pub enum I18nError {
    #[error("unsupported language: {code}")]
    UnsupportedLanguage { code: String },

    #[error("failed to load language resources for `{language}`")]
    ResourceLoad {
        language: LanguageCode,
        #[source]
        source: Box<LifelineError>,
    },
}

/// Ads SDK failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdsError {
    #[error("ads sdk error: {message}")]
    Sdk { message: String },

    #[error("ads sdk is not initialized")]
    NotInitialized,
}
