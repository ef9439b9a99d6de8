//! In-memory key/value store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lifeline_app::ports::KeyValueStore;
use lifeline_domain::error::LifelineError;

/// Volatile stand-in for the device's persisted storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`, as if written by a previous run.
    pub fn seeded<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, LifelineError>> + Send {
        let value = self.lock().get(key).cloned();
        async { Ok(value) }
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), LifelineError>> + Send {
        self.lock().insert(key.to_string(), value);
        async { Ok(()) }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), LifelineError>> + Send {
        self.lock().remove(key);
        async { Ok(()) }
    }
}
