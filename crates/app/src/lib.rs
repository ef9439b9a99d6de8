//! # lifeline-app
//!
//! Application layer: the service lifecycle core, **port definitions**
//! (traits) and the concrete services.
//!
//! ## Responsibilities
//! - [`registry::SingletonRegistry`]: one lazily constructed instance per
//!   service type
//! - [`mediator::ServiceMediator`]: sequential, fail-soft, idempotent
//!   initialization of every registered service
//! - [`notifier::Notifier`] / [`observable::Observable`]: in-process
//!   subscribe/broadcast channels
//! - Define **port traits** that adapters must implement:
//!   - `KeyValueStore`: persisted key/value storage
//!   - `HttpTransport`: send one HTTP request
//!   - `AdsSdk`: the ads SDK
//!   - `LocaleSource`: device locale and translation bundles
//! - The services themselves (`http`, `auth`, `config`, `i18n`, `ads`)
//!
//! ## Dependency rule
//! Depends on `lifeline-domain` only (plus `tokio::sync` / `tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod mediator;
pub mod notifier;
pub mod observable;
pub mod ports;
pub mod registry;
pub mod services;
