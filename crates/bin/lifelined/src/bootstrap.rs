//! Wiring and startup sequence.
//!
//! Services are provided to the registry in dependency order and then
//! instantiated in that same order; construction registers each one with the
//! mediator, so the batch initializes `http`, `auth`, `config`, `i18n` and
//! `ads` one after the other.

use std::sync::Arc;

use lifeline_adapter_virtual::{MemoryStore, StaticLocaleSource, VirtualAdsSdk, VirtualHttpTransport};
use lifeline_app::mediator::ServiceMediator;
use lifeline_app::registry::SingletonRegistry;
use lifeline_app::services::{AdsService, AuthService, ConfigService, HttpService, I18nService};
use lifeline_domain::error::LifelineError;
use lifeline_domain::report::InitializationReport;

use crate::config::{Config, FailurePolicy};

pub type Http = HttpService<Arc<VirtualHttpTransport>>;
pub type Auth = AuthService<Arc<VirtualHttpTransport>, Arc<MemoryStore>>;
pub type Flags = ConfigService<Arc<MemoryStore>>;
pub type I18n = I18nService<Arc<MemoryStore>, StaticLocaleSource>;
pub type Ads = AdsService<Arc<VirtualAdsSdk>>;

/// Outbound adapters shared by the services.
pub struct Adapters {
    pub store: Arc<MemoryStore>,
    pub transport: Arc<VirtualHttpTransport>,
    pub ads_sdk: Arc<VirtualAdsSdk>,
    pub locale: StaticLocaleSource,
}

impl Adapters {
    /// Virtual adapters configured from the `[locale]` and `[demo]` sections.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let transport = VirtualHttpTransport::with_demo_auth();
        transport.set_offline(config.demo.offline);
        let ads_sdk = match &config.demo.ads_failure {
            Some(message) => VirtualAdsSdk::failing(message.clone()),
            None => VirtualAdsSdk::new(),
        };
        Self {
            store: Arc::new(MemoryStore::new()),
            transport: Arc::new(transport),
            ads_sdk: Arc::new(ads_sdk),
            locale: StaticLocaleSource::new(config.locale.device.clone()),
        }
    }
}

/// Handles on every started service.
pub struct Services {
    pub http: Arc<Http>,
    pub auth: Arc<Auth>,
    pub flags: Arc<Flags>,
    pub i18n: Arc<I18n>,
    pub ads: Arc<Ads>,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to wire services")]
    Wiring(#[from] LifelineError),

    #[error("startup aborted: {report}")]
    Aborted { report: InitializationReport },
}

/// Provide a factory for every service.
pub fn provide_services(registry: &SingletonRegistry, config: &Config, adapters: Adapters) {
    let Adapters {
        store,
        transport,
        ads_sdk,
        locale,
    } = adapters;

    let http_config = config.http_config();
    registry.provide_service(move |_| {
        Ok(HttpService::new(Arc::clone(&transport), http_config.clone()))
    });

    let auth_store = Arc::clone(&store);
    registry.provide_service(move |registry| {
        Ok(AuthService::new(
            registry.get_instance::<Http>()?,
            Arc::clone(&auth_store),
        ))
    });

    let flags_store = Arc::clone(&store);
    let defaults = config.flags.clone();
    registry.provide_service(move |_| {
        Ok(ConfigService::new(
            Arc::clone(&flags_store),
            defaults.clone(),
        ))
    });

    registry.provide_service(move |_| Ok(I18nService::new(Arc::clone(&store), locale.clone())));

    let environment = config.ads.environment;
    let units = config.production_ad_units();
    registry.provide_service(move |_| {
        Ok(AdsService::new(Arc::clone(&ads_sdk), environment, units.clone()))
    });
}

/// Construct every service in dependency order.
///
/// # Errors
///
/// Returns the first construction failure, e.g. a missing factory.
pub fn instantiate(registry: &SingletonRegistry) -> Result<Services, LifelineError> {
    Ok(Services {
        http: registry.get_instance()?,
        auth: registry.get_instance()?,
        flags: registry.get_instance()?,
        i18n: registry.get_instance()?,
        ads: registry.get_instance()?,
    })
}

/// Instantiate the services, run the initialization batch and apply the
/// failure policy to the report.
///
/// # Errors
///
/// [`BootstrapError::Wiring`] when a service cannot be constructed and
/// [`BootstrapError::Aborted`] when a service failed under
/// [`FailurePolicy::Abort`].
pub async fn run(
    registry: &SingletonRegistry,
    policy: FailurePolicy,
) -> Result<(Services, InitializationReport), BootstrapError> {
    let services = instantiate(registry)?;
    let mediator = registry.get_instance::<ServiceMediator>()?;
    let report = mediator.initialize_services().await;

    for failure in report.failures() {
        tracing::warn!(
            service = failure.service,
            cause = %failure.root_cause(),
            "service unavailable"
        );
    }
    if policy == FailurePolicy::Abort && report.failed_count() > 0 {
        return Err(BootstrapError::Aborted { report });
    }
    Ok((services, report))
}
