//! Config service: feature flags persisted in the key/value store.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use lifeline_domain::error::LifelineError;
use lifeline_domain::flags::{FlagChange, FlagMap};

use crate::notifier::{Notifier, Subscription};
use crate::ports::{Initializable, KeyValueStore};

pub const REMOTE_CONFIG_KEY: &str = "remote_config";

/// Feature flags: built-in defaults overlaid with the persisted values.
pub struct ConfigService<S> {
    store: S,
    flags: Mutex<FlagMap>,
    changes: Notifier<FlagChange>,
}

impl<S: KeyValueStore + Send + Sync> ConfigService<S> {
    pub fn new(store: S, defaults: FlagMap) -> Self {
        Self {
            store,
            flags: Mutex::new(defaults),
            changes: Notifier::new("flag_change"),
        }
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().get(key).cloned()
    }

    /// `false` when the flag is unset or not a boolean.
    #[must_use]
    pub fn bool_flag(&self, key: &str) -> bool {
        self.lock()
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn flags(&self) -> FlagMap {
        self.lock().clone()
    }

    /// Set (`Some`) or clear (`None`) a flag, persist the whole map, then
    /// broadcast the change.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails; the in-memory flags are
    /// left untouched in that case.
    pub async fn set_flag(
        &self,
        key: &str,
        value: Option<serde_json::Value>,
    ) -> Result<FlagChange, LifelineError> {
        let (previous, next) = {
            let flags = self.lock();
            let mut next = flags.clone();
            let previous = match &value {
                Some(value) => next.insert(key.to_string(), value.clone()),
                None => next.remove(key),
            };
            (previous, next)
        };

        self.store
            .set(REMOTE_CONFIG_KEY, serde_json::to_string(&next)?)
            .await?;
        *self.lock() = next;

        let change = FlagChange {
            key: key.to_string(),
            previous,
            current: value,
        };
        self.changes.notify(&change);
        Ok(change)
    }

    pub fn on_flag_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FlagChange) + Send + Sync + 'static,
    {
        self.changes.subscribe(listener)
    }

    #[must_use]
    pub fn changes(&self) -> &Notifier<FlagChange> {
        &self.changes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlagMap> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<S: KeyValueStore + Send + Sync> Initializable for ConfigService<S> {
    fn name(&self) -> &'static str {
        "config"
    }

    async fn initialize(&self) -> Result<(), LifelineError> {
        let Some(raw) = self.store.get(REMOTE_CONFIG_KEY).await? else {
            tracing::info!(flags = self.lock().len(), "no stored flags, using defaults");
            return Ok(());
        };
        let stored: FlagMap = serde_json::from_str(&raw)?;
        let mut flags = self.lock();
        flags.extend(stored);
        tracing::info!(flags = flags.len(), "flags loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Arc;

    use serde_json::json;

    #[derive(Default)]
    struct InMemoryStore {
        values: Mutex<HashMap<String, String>>,
        read_only: bool,
    }

    impl KeyValueStore for InMemoryStore {
        fn get(
            &self,
            key: &str,
        ) -> impl Future<Output = Result<Option<String>, LifelineError>> + Send {
            let value = self.values.lock().unwrap().get(key).cloned();
            async { Ok(value) }
        }

        fn set(
            &self,
            key: &str,
            value: String,
        ) -> impl Future<Output = Result<(), LifelineError>> + Send {
            let result = if self.read_only {
                Err(LifelineError::storage("read-only store"))
            } else {
                self.values.lock().unwrap().insert(key.to_string(), value);
                Ok(())
            };
            async { result }
        }

        fn remove(&self, key: &str) -> impl Future<Output = Result<(), LifelineError>> + Send {
            self.values.lock().unwrap().remove(key);
            async { Ok(()) }
        }
    }

    fn defaults() -> FlagMap {
        FlagMap::from([
            ("dark_mode".to_string(), json!(false)),
            ("max_items".to_string(), json!(20)),
        ])
    }

    #[tokio::test]
    async fn should_keep_defaults_when_nothing_is_stored() {
        let svc = ConfigService::new(InMemoryStore::default(), defaults());

        svc.initialize().await.unwrap();

        assert!(!svc.bool_flag("dark_mode"));
        assert_eq!(svc.flag("max_items"), Some(json!(20)));
    }

    #[tokio::test]
    async fn should_overlay_stored_flags_on_defaults() {
        let store = InMemoryStore::default();
        store
            .set(REMOTE_CONFIG_KEY, r#"{"dark_mode":true,"beta":"on"}"#.to_string())
            .await
            .unwrap();
        let svc = ConfigService::new(store, defaults());

        svc.initialize().await.unwrap();

        assert!(svc.bool_flag("dark_mode"));
        assert_eq!(svc.flag("beta"), Some(json!("on")));
        assert_eq!(svc.flag("max_items"), Some(json!(20)));
    }

    #[tokio::test]
    async fn should_fail_initialize_on_malformed_stored_flags() {
        let store = InMemoryStore::default();
        store
            .set(REMOTE_CONFIG_KEY, "{not json".to_string())
            .await
            .unwrap();
        let svc = ConfigService::new(store, defaults());

        let err = svc.initialize().await.unwrap_err();
        assert!(matches!(err, LifelineError::Serialization(_)));
    }

    #[tokio::test]
    async fn should_persist_and_broadcast_flag_change() {
        let store = Arc::new(InMemoryStore::default());
        let svc = ConfigService::new(Arc::clone(&store), defaults());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = svc.on_flag_change(move |c: &FlagChange| sink.lock().unwrap().push(c.clone()));

        let change = svc.set_flag("dark_mode", Some(json!(true))).await.unwrap();

        assert_eq!(change.previous, Some(json!(false)));
        assert!(change.is_effective());
        assert_eq!(*seen.lock().unwrap(), vec![change]);
        let persisted: FlagMap =
            serde_json::from_str(&store.get(REMOTE_CONFIG_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(persisted.get("dark_mode"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn should_leave_flags_untouched_when_persist_fails() {
        let store = InMemoryStore {
            read_only: true,
            ..InMemoryStore::default()
        };
        let svc = ConfigService::new(store, defaults());
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let _sub = svc.on_flag_change(move |_: &FlagChange| *counter.lock().unwrap() += 1);

        let result = svc.set_flag("max_items", None).await;

        assert!(matches!(result, Err(LifelineError::Storage(_))));
        assert_eq!(svc.flag("max_items"), Some(json!(20)));
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
