//! Application services: the concrete services brought up at startup.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.
//! All of them implement [`Initializable`](crate::ports::Initializable) and
//! publish their state through [`Observable`](crate::observable::Observable)
//! channels.
//!
//! Registration order is the dependency order: `http`, `auth`, `config`,
//! `i18n`, `ads`.

pub mod ads_service;
pub mod auth_service;
pub mod config_service;
pub mod http_service;
pub mod i18n_service;

pub use ads_service::AdsService;
pub use auth_service::AuthService;
pub use config_service::ConfigService;
pub use http_service::HttpService;
pub use i18n_service::I18nService;
