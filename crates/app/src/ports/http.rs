//! HTTP transport port: sends one resolved request.

use std::future::Future;

use lifeline_domain::error::LifelineError;
use lifeline_domain::http::{HttpRequest, HttpResponse};

/// Low-level HTTP transport.
///
/// Non-2xx answers are returned as `Ok` responses; only failures to get any
/// answer at all (offline, DNS, reset) are `Err`, typically
/// [`HttpError::Network`](lifeline_domain::error::HttpError::Network).
pub trait HttpTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, LifelineError>> + Send;
}

impl<T: HttpTransport + Send + Sync> HttpTransport for std::sync::Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, LifelineError>> + Send {
        (**self).send(request)
    }
}
