//! Ads service: starts the ads SDK and hands out ad unit ids.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use lifeline_domain::ads::{AdUnitIds, AdapterStatus, AdsEnvironment, RequestConfiguration};
use lifeline_domain::error::{AdsError, LifelineError};

use crate::notifier::Subscription;
use crate::observable::Observable;
use crate::ports::{AdsSdk, Initializable};

pub struct AdsService<A> {
    sdk: A,
    environment: AdsEnvironment,
    production_ids: AdUnitIds,
    request_configuration: RequestConfiguration,
    initialized: Observable<bool>,
    adapters: Mutex<Vec<AdapterStatus>>,
}

impl<A: AdsSdk + Send + Sync> AdsService<A> {
    /// `production_ids` are only served in [`AdsEnvironment::Production`].
    pub fn new(sdk: A, environment: AdsEnvironment, production_ids: AdUnitIds) -> Self {
        Self {
            sdk,
            environment,
            production_ids,
            request_configuration: RequestConfiguration::default(),
            initialized: Observable::new("ads_initialized", false),
            adapters: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_request_configuration(mut self, config: RequestConfiguration) -> Self {
        self.request_configuration = config;
        self
    }

    #[must_use]
    pub fn environment(&self) -> AdsEnvironment {
        self.environment
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// # Errors
    ///
    /// Returns [`AdsError::NotInitialized`] until `initialize` succeeded.
    pub fn ensure_initialized(&self) -> Result<(), AdsError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(AdsError::NotInitialized)
        }
    }

    /// Ad unit ids for the configured environment.
    #[must_use]
    pub fn ad_unit_ids(&self) -> AdUnitIds {
        match self.environment {
            AdsEnvironment::Test => AdUnitIds::test(),
            AdsEnvironment::Production => self.production_ids.clone(),
        }
    }

    /// Mediation adapter statuses reported by the last successful start.
    #[must_use]
    pub fn adapter_statuses(&self) -> Vec<AdapterStatus> {
        self.adapters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn on_initialized_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.initialized.subscribe(listener)
    }
}

#[async_trait]
impl<A: AdsSdk + Send + Sync> Initializable for AdsService<A> {
    fn name(&self) -> &'static str {
        "ads"
    }

    /// SDK failures propagate: the service ends up `Failed`.
    async fn initialize(&self) -> Result<(), LifelineError> {
        let statuses = self.sdk.initialize().await?;
        self.sdk
            .set_request_configuration(self.request_configuration.clone())
            .await?;

        let ready = statuses.iter().filter(|s| s.ready).count();
        tracing::info!(
            environment = ?self.environment,
            adapters = statuses.len(),
            ready,
            "ads sdk initialized"
        );
        *self.adapters.lock().unwrap_or_else(PoisonError::into_inner) = statuses;
        self.initialized.set(true);
        Ok(())
    }
}
