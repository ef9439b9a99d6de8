//! Initializable port: the capability a service exposes to the mediator.

use async_trait::async_trait;

use lifeline_domain::error::LifelineError;

/// A service that must be brought to readiness before the application runs.
///
/// The mediator stores registered services as `Arc<dyn Initializable>`, so
/// the trait is object-safe (hence `async_trait` instead of `impl Future`).
///
/// Implementations use interior mutability: `initialize` takes `&self`
/// because the same instance is shared with every consumer.
#[async_trait]
pub trait Initializable: Send + Sync {
    /// Stable, unique service name (e.g. `"auth"`), used as the identity in
    /// logs and in the initialization report.
    fn name(&self) -> &'static str;

    /// Bring the service to readiness.
    ///
    /// Any timeout belongs to the I/O performed here and surfaces as an
    /// ordinary `Err`.
    async fn initialize(&self) -> Result<(), LifelineError>;
}
