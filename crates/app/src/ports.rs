//! Port definitions: traits that adapters and services implement.
//!
//! Ports are the boundaries between the lifecycle core and the outside world.
//! `Initializable` is the one the mediator consumes; the rest are the narrow
//! contracts the concrete services use to reach storage, the network, the ad
//! SDK and the device locale.

pub mod ads;
pub mod http;
pub mod initializable;
pub mod locale;
pub mod storage;

pub use ads::AdsSdk;
pub use http::HttpTransport;
pub use initializable::Initializable;
pub use locale::LocaleSource;
pub use storage::KeyValueStore;
