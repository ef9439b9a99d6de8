//! Storage port: persisted key/value access.

use std::future::Future;

use lifeline_domain::error::LifelineError;

/// Persisted string key/value storage (the device's async storage).
pub trait KeyValueStore {
    /// Read a value; `None` when the key was never written.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, LifelineError>> + Send;

    /// Write (or overwrite) a value.
    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), LifelineError>> + Send;

    /// Delete a key. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), LifelineError>> + Send;
}

impl<T: KeyValueStore + Send + Sync> KeyValueStore for std::sync::Arc<T> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, LifelineError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), LifelineError>> + Send {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), LifelineError>> + Send {
        (**self).remove(key)
    }
}
