//! Ads SDK port.

use std::future::Future;

use lifeline_domain::ads::{AdapterStatus, RequestConfiguration};
use lifeline_domain::error::LifelineError;

/// The mobile ads SDK, reduced to what the lifecycle needs.
pub trait AdsSdk {
    /// Start the SDK; returns the status of each mediation adapter.
    fn initialize(&self) -> impl Future<Output = Result<Vec<AdapterStatus>, LifelineError>> + Send;

    /// Apply global request settings (content rating, consent tags, …).
    fn set_request_configuration(
        &self,
        config: RequestConfiguration,
    ) -> impl Future<Output = Result<(), LifelineError>> + Send;
}

impl<T: AdsSdk + Send + Sync> AdsSdk for std::sync::Arc<T> {
    fn initialize(&self) -> impl Future<Output = Result<Vec<AdapterStatus>, LifelineError>> + Send {
        (**self).initialize()
    }

    fn set_request_configuration(
        &self,
        config: RequestConfiguration,
    ) -> impl Future<Output = Result<(), LifelineError>> + Send {
        (**self).set_request_configuration(config)
    }
}
