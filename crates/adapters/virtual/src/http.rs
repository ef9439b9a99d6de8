//! Scripted HTTP backend.
//!
//! Routes are matched on method and path (the URL minus scheme and host).
//! Unmatched requests answer 404. While offline every request fails with
//! [`HttpError::Network`], like a device without connectivity.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::json;

use lifeline_app::ports::HttpTransport;
use lifeline_domain::auth::User;
use lifeline_domain::error::{HttpError, LifelineError};
use lifeline_domain::http::{HttpMethod, HttpRequest, HttpResponse, STATUS_UNAUTHORIZED};
use lifeline_domain::time::now;

/// Account accepted by the demo auth backend.
pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password";
/// Token issued by the demo auth backend.
pub const DEMO_TOKEN: &str = "demo-token";

type Handler = Arc<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// In-process HTTP backend.
#[derive(Default)]
pub struct VirtualHttpTransport {
    routes: Mutex<HashMap<(HttpMethod, String), Handler>>,
    offline: AtomicBool,
    latency: Option<Duration>,
}

impl VirtualHttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend serving `/auth/login`, `/auth/register`, `/auth/logout` and
    /// `/auth/me` for the demo account.
    #[must_use]
    pub fn with_demo_auth() -> Self {
        let transport = Self::new();
        transport.handle(HttpMethod::Post, "/auth/login", |request| {
            let body = request.body.as_ref();
            let field = |name: &str| {
                body.and_then(|b| b.get(name))
                    .and_then(serde_json::Value::as_str)
            };
            if field("email") == Some(DEMO_EMAIL) && field("password") == Some(DEMO_PASSWORD) {
                HttpResponse::ok(json!({ "user": demo_user(DEMO_EMAIL, "Demo"), "token": DEMO_TOKEN }))
            } else {
                HttpResponse::new(
                    STATUS_UNAUTHORIZED,
                    json!({ "message": "invalid credentials" }),
                )
            }
        });
        transport.handle(HttpMethod::Post, "/auth/register", |request| {
            let body = request.body.clone().unwrap_or_default();
            let text = |name: &str| {
                body.get(name)
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            HttpResponse::new(
                201,
                json!({ "user": demo_user(&text("email"), &text("name")), "token": DEMO_TOKEN }),
            )
        });
        transport.handle(HttpMethod::Post, "/auth/logout", |_| {
            HttpResponse::ok(json!({}))
        });
        transport.handle(HttpMethod::Get, "/auth/me", |request| {
            let expected = format!("Bearer {DEMO_TOKEN}");
            if request.header("Authorization") == Some(expected.as_str()) {
                HttpResponse::ok(demo_user(DEMO_EMAIL, "Demo"))
            } else {
                HttpResponse::new(
                    STATUS_UNAUTHORIZED,
                    json!({ "message": "token expired" }),
                )
            }
        });
        transport
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serve `path` with a dynamic handler, replacing any previous route.
    pub fn handle<F>(&self, method: HttpMethod, path: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method, path.to_string()), Arc::new(handler));
    }

    /// Serve `path` with a fixed answer.
    pub fn route(&self, method: HttpMethod, path: &str, status: u16, body: serde_json::Value) {
        let response = HttpResponse::new(status, body);
        self.handle(method, path, move |_| response.clone());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, LifelineError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(HttpError::Network {
                message: "network is unreachable".to_string(),
            }
            .into());
        }
        let path = path_of(&request.url);
        let handler = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(request.method, path.to_string()))
            .cloned();
        let response = match handler {
            Some(handler) => handler(request),
            None => HttpResponse::new(404, json!({ "message": format!("no route for {path}") })),
        };
        tracing::debug!(method = %request.method, path, status = response.status, "virtual request");
        Ok(response)
    }
}

impl HttpTransport for VirtualHttpTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, LifelineError>> + Send {
        let result = self.dispatch(&request);
        let latency = self.latency;
        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            result
        }
    }
}

/// Path component of `url` (`https://host/a/b?x` → `/a/b`).
fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = after_scheme
        .find('/')
        .map_or("/", |start| &after_scheme[start..]);
    path.split(['?', '#']).next().unwrap_or(path)
}

fn demo_user(email: &str, name: &str) -> serde_json::Value {
    let timestamp = now();
    let user = User {
        id: "demo-user".to_string(),
        email: email.to_string(),
        name: name.to_string(),
        profile_image: None,
        created_at: timestamp,
        updated_at: timestamp,
    };
    serde_json::to_value(user).unwrap_or_default()
}
