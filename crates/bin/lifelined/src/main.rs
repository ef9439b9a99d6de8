//! # lifelined: lifeline daemon
//!
//! Composition root that wires the adapters together and brings every
//! service to readiness.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Install the tracing subscriber
//! - Provide each service to the process-wide singleton registry
//! - Run the initialization batch and apply the failure policy
//! - Log state changes until SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use lifeline_app::registry::SingletonRegistry;
use lifeline_domain::auth::AuthState;
use lifeline_domain::flags::FlagChange;
use lifeline_domain::language::LanguageCode;
use lifelined::bootstrap::{self, Adapters};
use lifelined::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter)?;

    let registry = SingletonRegistry::global();
    bootstrap::provide_services(registry, &config, Adapters::from_config(&config));
    let (services, report) = bootstrap::run(registry, config.startup.on_failure).await?;

    for entry in report.entries() {
        tracing::info!(
            service = entry.service,
            state = %entry.outcome.state(),
            elapsed_ms = entry.elapsed_ms(),
            "service settled"
        );
    }

    let _subscriptions = [
        services
            .auth
            .on_state_change(|state: &AuthState| {
                tracing::info!(
                    authenticated = state.is_authenticated,
                    loading = state.is_loading,
                    error = state.error.as_deref(),
                    "auth state changed"
                );
            }),
        services.i18n.on_language_change(|language: &LanguageCode| {
            tracing::info!(%language, "language changed");
        }),
        services.flags.on_flag_change(|change: &FlagChange| {
            tracing::info!(flag = %change.key, current = ?change.current, "flag changed");
        }),
    ];

    let status = if report.is_all_ready() {
        services.i18n.translate("app.ready")
    } else {
        let failed = report.failed_count().to_string();
        services
            .i18n
            .translate_with("app.degraded", &[("count", failed.as_str())])
    };
    tracing::info!(%report, "{status}");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutting down");
    Ok(())
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).with_context(|| format!("invalid log filter `{filter}`"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
