//! Simulated ads SDK.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use lifeline_app::ports::AdsSdk;
use lifeline_domain::ads::{AdapterStatus, RequestConfiguration};
use lifeline_domain::error::{AdsError, LifelineError};

/// Ads SDK that starts instantly with a single ready mediation adapter,
/// or fails with a fixed message.
#[derive(Debug, Default)]
pub struct VirtualAdsSdk {
    failure: Option<String>,
    configuration: Mutex<Option<RequestConfiguration>>,
}

impl VirtualAdsSdk {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// SDK whose `initialize` always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// The configuration applied last, if any.
    #[must_use]
    pub fn request_configuration(&self) -> Option<RequestConfiguration> {
        self.configuration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AdsSdk for VirtualAdsSdk {
    fn initialize(&self) -> impl Future<Output = Result<Vec<AdapterStatus>, LifelineError>> + Send {
        let result = match &self.failure {
            Some(message) => Err(AdsError::Sdk {
                message: message.clone(),
            }
            .into()),
            None => Ok(vec![AdapterStatus {
                name: "virtual".to_string(),
                ready: true,
                description: "simulated mediation adapter".to_string(),
            }]),
        };
        async { result }
    }

    fn set_request_configuration(
        &self,
        config: RequestConfiguration,
    ) -> impl Future<Output = Result<(), LifelineError>> + Send {
        *self
            .configuration
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(config);
        async { Ok(()) }
    }
}
