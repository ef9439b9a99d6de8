//! # lifeline-adapter-virtual
//!
//! Virtual/demo adapters implementing every outbound port in-process, for
//! tests and for running the daemon without a device or a backend.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`MemoryStore`] | `KeyValueStore` | `HashMap` behind a mutex |
//! | [`VirtualHttpTransport`] | `HttpTransport` | Scripted routes, optional demo auth backend, offline switch |
//! | [`VirtualAdsSdk`] | `AdsSdk` | Reports one ready adapter, or fails on demand |
//! | [`StaticLocaleSource`] | `LocaleSource` | Bundled `en` / `ko` translations |
//!
//! ## Dependency rule
//!
//! Depends on `lifeline-app` (port traits) and `lifeline-domain` only.

mod ads;
mod http;
mod locale;
mod store;

pub use ads::VirtualAdsSdk;
pub use http::{DEMO_EMAIL, DEMO_PASSWORD, DEMO_TOKEN, VirtualHttpTransport};
pub use locale::StaticLocaleSource;
pub use store::MemoryStore;
