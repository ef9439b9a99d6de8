//! Authentication value objects and the session state pushed to consumers.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::Timestamp;

/// A signed-in user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Email/password pair for `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] when either field is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "email" });
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyField { field: "password" });
        }
        Ok(())
    }
}

/// Payload for `register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub name: String,
}

impl RegisterRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] when a field is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.credentials.validate()?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        Ok(())
    }
}

/// Backend answer to `login` / `register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Session snapshot broadcast on the auth-state channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// State after a successful sign-in.
    #[must_use]
    pub fn signed_in(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    /// Same state with the loading flag set and the error cleared.
    #[must_use]
    pub fn loading(mut self) -> Self {
        self.is_loading = true;
        self.error = None;
        self
    }

    /// Same state with loading cleared and `error` recorded.
    #[must_use]
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.is_loading = false;
        self.error = Some(error.into());
        self
    }
}
