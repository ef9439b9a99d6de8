//! Auth service: session restore, login/register/logout and the auth-state
//! channel.
//!
//! The session (token and user) is persisted in the key/value store so a
//! restart can restore it; [`Initializable::initialize`] re-validates a
//! stored token against `/auth/me` and never fails the batch.

use std::sync::Arc;

use async_trait::async_trait;

use lifeline_domain::auth::{AuthResponse, AuthState, Credentials, RegisterRequest, User};
use lifeline_domain::error::{AuthError, LifelineError};
use lifeline_domain::http::STATUS_UNAUTHORIZED;

use crate::notifier::Subscription;
use crate::observable::Observable;
use crate::ports::{HttpTransport, Initializable, KeyValueStore};
use crate::services::http_service::HttpService;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";

/// Application service for the signed-in session.
pub struct AuthService<T, S> {
    http: Arc<HttpService<T>>,
    store: S,
    state: Observable<AuthState>,
}

impl<T, S> AuthService<T, S>
where
    T: HttpTransport + Send + Sync,
    S: KeyValueStore + Send + Sync,
{
    pub fn new(http: Arc<HttpService<T>>, store: S) -> Self {
        Self {
            http,
            store,
            state: Observable::new("auth_state", AuthState::default()),
        }
    }

    /// Current session snapshot.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.get()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.get().is_authenticated
    }

    /// Listen to every auth-state write.
    pub fn on_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        self.state.subscribe(listener)
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns [`LifelineError::Validation`] for blank credentials,
    /// [`AuthError::InvalidCredentials`] on 401, [`AuthError::Network`] when
    /// the backend is unreachable and [`AuthError::Unknown`] otherwise.
    pub async fn login(&self, credentials: Credentials) -> Result<AuthResponse, LifelineError> {
        credentials.validate()?;
        self.state.update(|s| *s = s.clone().loading());

        match self.http.post(LOGIN_PATH, &credentials).await {
            Ok(response) => {
                self.start_session(&response).await?;
                Ok(response)
            }
            Err(err) => Err(self.fail(map_error(err, Some(AuthError::InvalidCredentials)))),
        }
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login), except a 401 maps to
    /// [`AuthError::Unknown`].
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, LifelineError> {
        request.validate()?;
        self.state.update(|s| *s = s.clone().loading());

        match self.http.post(REGISTER_PATH, &request).await {
            Ok(response) => {
                self.start_session(&response).await?;
                Ok(response)
            }
            Err(err) => Err(self.fail(map_error(err, None))),
        }
    }

    /// Sign out. A server-side failure is logged; the local session is
    /// cleared regardless.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the persisted session cannot be removed.
    pub async fn logout(&self) -> Result<(), LifelineError> {
        self.state.update(|s| s.is_loading = true);
        if let Err(err) = self
            .http
            .post::<_, serde_json::Value>(LOGOUT_PATH, &serde_json::Value::Null)
            .await
        {
            tracing::warn!(error = %err, "server logout failed");
        }
        self.clear_session(None).await
    }

    /// Fetch the current user with the stored token.
    ///
    /// A 401 means the token is no longer valid: the session is cleared.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] on 401, [`AuthError::Network`] when the
    /// backend is unreachable and [`AuthError::Unknown`] otherwise.
    pub async fn me(&self) -> Result<User, LifelineError> {
        self.state.update(|s| *s = s.clone().loading());

        match self.http.get::<User>(ME_PATH).await {
            Ok(user) => {
                self.store
                    .set(USER_KEY, serde_json::to_string(&user)?)
                    .await?;
                let token = self.http.token();
                self.state.update(|s| {
                    s.user = Some(user.clone());
                    s.token = token;
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
                Ok(user)
            }
            Err(err) => {
                let err = map_error(err, Some(AuthError::Unauthorized));
                if err == AuthError::Unauthorized {
                    self.clear_session(Some(err.to_string())).await?;
                    return Err(err.into());
                }
                Err(self.fail(err))
            }
        }
    }

    async fn restore_session(&self) -> Result<(), LifelineError> {
        let Some(token) = self.store.get(TOKEN_KEY).await? else {
            tracing::debug!("no stored session");
            return Ok(());
        };
        let cached_user = self
            .store
            .get(USER_KEY)
            .await?
            .and_then(|raw| serde_json::from_str::<User>(&raw).ok());

        self.http.set_token(Some(token.clone()));
        self.state.update(|s| {
            s.token = Some(token);
            s.user = cached_user;
        });
        self.me().await?;
        Ok(())
    }

    async fn start_session(&self, response: &AuthResponse) -> Result<(), LifelineError> {
        self.store.set(TOKEN_KEY, response.token.clone()).await?;
        self.store
            .set(USER_KEY, serde_json::to_string(&response.user)?)
            .await?;
        self.http.set_token(Some(response.token.clone()));
        self.state.set(AuthState::signed_in(
            response.user.clone(),
            response.token.clone(),
        ));
        tracing::info!(user_id = %response.user.id, "signed in");
        Ok(())
    }

    async fn clear_session(&self, error: Option<String>) -> Result<(), LifelineError> {
        self.http.set_token(None);
        let removed = match self.store.remove(TOKEN_KEY).await {
            Ok(()) => self.store.remove(USER_KEY).await,
            Err(err) => Err(err),
        };
        self.state.set(AuthState {
            error,
            ..AuthState::default()
        });
        tracing::info!("session cleared");
        removed
    }

    fn fail(&self, err: AuthError) -> LifelineError {
        let message = err.to_string();
        self.state.update(|s| *s = s.clone().failed(message));
        err.into()
    }
}

#[async_trait]
impl<T, S> Initializable for AuthService<T, S>
where
    T: HttpTransport + Send + Sync,
    S: KeyValueStore + Send + Sync,
{
    fn name(&self) -> &'static str {
        "auth"
    }

    /// Restore a stored session. Failures are recorded in the auth state and
    /// logged; they never fail initialization.
    async fn initialize(&self) -> Result<(), LifelineError> {
        if let Err(err) = self.restore_session().await {
            tracing::warn!(error = %err.display_chain(), "session restore failed, continuing signed out");
        }
        Ok(())
    }
}

fn map_error(err: LifelineError, on_unauthorized: Option<AuthError>) -> AuthError {
    match err {
        LifelineError::Http(http) if http.is_network() => AuthError::Network,
        LifelineError::Http(http) => match (http.status(), on_unauthorized) {
            (Some(STATUS_UNAUTHORIZED), Some(mapped)) => mapped,
            _ => AuthError::Unknown {
                message: http.to_string(),
            },
        },
        other => AuthError::Unknown {
            message: other.display_chain(),
        },
    }
}
