//! HTTP service: JSON client over the transport port.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use lifeline_domain::error::{HttpError, LifelineError};
use lifeline_domain::http::{HttpConfig, HttpMethod, HttpRequest};

use crate::ports::{HttpTransport, Initializable};

/// JSON API client shared by every service that talks to the backend.
pub struct HttpService<T> {
    transport: T,
    config: HttpConfig,
    token: Mutex<Option<String>>,
}

impl<T: HttpTransport + Send + Sync> HttpService<T> {
    pub fn new(transport: T, config: HttpConfig) -> Self {
        Self {
            transport,
            config,
            token: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Set or clear the bearer token attached to every request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, LifelineError> {
        self.request(HttpMethod::Get, path, None).await
    }

    /// # Errors
    ///
    /// Fails when `body` cannot be serialized; otherwise see
    /// [`request`](Self::request).
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, LifelineError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.request(HttpMethod::Post, path, Some(body)).await
    }

    /// # Errors
    ///
    /// Fails when `body` cannot be serialized; otherwise see
    /// [`request`](Self::request).
    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R, LifelineError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.request(HttpMethod::Put, path, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, LifelineError> {
        self.request(HttpMethod::Delete, path, None).await
    }

    /// Send one request and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// - [`HttpError::Timeout`] when no answer arrives within the configured
    ///   timeout
    /// - [`HttpError::Network`] when the transport fails or reports status 0
    /// - [`HttpError::Status`] for any non-2xx answer
    /// - [`HttpError::Decode`] when the body does not match `R`
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<R, LifelineError> {
        let request = self.build_request(method, path, body);
        tracing::debug!(%method, url = %request.url, "sending request");

        let response = tokio::time::timeout(self.config.timeout, self.transport.send(request))
            .await
            .map_err(|_| HttpError::Timeout {
                after_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        if response.status == 0 {
            return Err(HttpError::Network {
                message: response.message(),
            }
            .into());
        }
        if !response.is_success() {
            tracing::debug!(%method, path, status = response.status, "request rejected");
            return Err(HttpError::Status {
                status: response.status,
                message: response.message(),
            }
            .into());
        }

        serde_json::from_value(response.body).map_err(|err| HttpError::Decode(err).into())
    }

    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> HttpRequest {
        let mut headers = self.config.default_headers.clone();
        if let Some(token) = self.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            url: self.config.url(path),
            headers,
            body,
        }
    }
}

#[async_trait]
impl<T: HttpTransport + Send + Sync> Initializable for HttpService<T> {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn initialize(&self) -> Result<(), LifelineError> {
        self.config.validate()?;
        tracing::info!(
            base_url = %self.config.base_url,
            timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            "http client configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_domain::error::ValidationError;
    use lifeline_domain::http::HttpResponse;
    use serde_json::json;
    use std::future::Future;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<HttpRequest>>,
        reply: Mutex<Option<HttpResponse>>,
        delay: Option<Duration>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: serde_json::Value) -> Self {
            Self {
                reply: Mutex::new(Some(HttpResponse::new(status, body))),
                ..Self::default()
            }
        }
    }

    impl HttpTransport for RecordingTransport {
        fn send(
            &self,
            request: HttpRequest,
        ) -> impl Future<Output = Result<HttpResponse, LifelineError>> + Send {
            self.sent.lock().unwrap().push(request);
            let reply = self.reply.lock().unwrap().clone();
            let delay = self.delay;
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                reply.ok_or_else(|| {
                    HttpError::Network {
                        message: "offline".to_string(),
                    }
                    .into()
                })
            }
        }
    }

    fn make_service(transport: RecordingTransport) -> HttpService<RecordingTransport> {
        HttpService::new(transport, HttpConfig::default())
    }

    #[tokio::test]
    async fn should_attach_default_headers_and_bearer_token() {
        let svc = make_service(RecordingTransport::replying(200, json!({"ok": true})));
        svc.set_token(Some("abc".to_string()));

        let body: serde_json::Value = svc.get("/auth/me").await.unwrap();
        assert_eq!(body, json!({"ok": true}));

        let sent = svc.transport.sent.lock().unwrap();
        assert_eq!(sent[0].url, "https://api.example.com/auth/me");
        assert_eq!(sent[0].header("authorization"), Some("Bearer abc"));
        assert_eq!(sent[0].header("Accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn should_send_json_body_on_post() {
        let svc = make_service(RecordingTransport::replying(201, json!({})));

        let _: serde_json::Value = svc.post("/items", &json!({"name": "x"})).await.unwrap();

        let sent = svc.transport.sent.lock().unwrap();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].body, Some(json!({"name": "x"})));
        assert!(sent[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn should_map_non_success_status_to_status_error() {
        let svc = make_service(RecordingTransport::replying(
            401,
            json!({"message": "expired"}),
        ));

        let err = svc.get::<serde_json::Value>("/auth/me").await.unwrap_err();
        assert!(matches!(
            err,
            LifelineError::Http(HttpError::Status { status: 401, ref message }) if message == "expired"
        ));
    }

    #[tokio::test]
    async fn should_map_status_zero_to_network_error() {
        let svc = make_service(RecordingTransport::replying(0, json!(null)));
        let err = svc.get::<serde_json::Value>("/x").await.unwrap_err();
        assert!(matches!(err, LifelineError::Http(HttpError::Network { .. })));
    }

    #[tokio::test]
    async fn should_propagate_transport_failure() {
        let svc = make_service(RecordingTransport::default());
        let err = svc.get::<serde_json::Value>("/x").await.unwrap_err();
        assert!(matches!(err, LifelineError::Http(ref e) if e.is_network()));
    }

    #[tokio::test]
    async fn should_time_out_slow_requests() {
        let transport = RecordingTransport {
            delay: Some(Duration::from_millis(200)),
            ..RecordingTransport::replying(200, json!({}))
        };
        let config = HttpConfig {
            timeout: Duration::from_millis(10),
            ..HttpConfig::default()
        };
        let svc = HttpService::new(transport, config);

        let err = svc.get::<serde_json::Value>("/slow").await.unwrap_err();
        assert!(matches!(
            err,
            LifelineError::Http(HttpError::Timeout { after_ms: 10 })
        ));
    }

    #[tokio::test]
    async fn should_report_decode_failure() {
        let svc = make_service(RecordingTransport::replying(200, json!("text")));
        let err = svc.get::<Vec<u32>>("/numbers").await.unwrap_err();
        assert!(matches!(err, LifelineError::Http(HttpError::Decode(_))));
    }

    #[tokio::test]
    async fn should_fail_initialize_on_invalid_config() {
        let config = HttpConfig {
            base_url: "ftp://nope".to_string(),
            ..HttpConfig::default()
        };
        let svc = HttpService::new(RecordingTransport::default(), config);

        let err = svc.initialize().await.unwrap_err();
        assert!(matches!(
            err,
            LifelineError::Validation(ValidationError::InvalidUrl { .. })
        ));
    }
}
