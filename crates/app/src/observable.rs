//! Observable value: a current value paired with a [`Notifier`] that
//! broadcasts every write.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::notifier::{Notifier, Subscription};

/// A value cell whose writes are pushed to subscribers.
///
/// Every `set` broadcasts, even when the new value equals the old one, so
/// consumers mirroring the value never miss a write.
pub struct Observable<T> {
    value: Mutex<T>,
    changes: Notifier<T>,
}

impl<T: Clone + Send + 'static> Observable<T> {
    #[must_use]
    pub fn new(channel: &'static str, initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            changes: Notifier::new(channel),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store `value`, then broadcast it.
    pub fn set(&self, value: T) {
        {
            let mut current = self.value.lock().unwrap_or_else(PoisonError::into_inner);
            current.clone_from(&value);
        }
        self.changes.notify(&value);
    }

    /// Modify the value in place, then broadcast the result.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let snapshot = {
            let mut current = self.value.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut current);
            current.clone()
        };
        self.changes.notify(&snapshot);
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.changes.subscribe(listener)
    }

    /// The underlying channel.
    #[must_use]
    pub fn changes(&self) -> &Notifier<T> {
        &self.changes
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Observable")
            .field("value", &*value)
            .field("changes", &self.changes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn should_store_and_broadcast_on_set() {
        let cell = Observable::new("flag", false);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = cell.subscribe(move |v: &bool| sink.lock().unwrap().push(*v));

        cell.set(true);

        assert!(cell.get());
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn should_broadcast_even_when_value_is_unchanged() {
        let cell = Observable::new("flag", 1);
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let _sub = cell.subscribe(move |_: &i32| *sink.lock().unwrap() += 1);

        cell.set(1);
        cell.set(1);

        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[test]
    fn should_let_listener_read_new_value_during_broadcast() {
        let cell = Arc::new(Observable::new("count", 0));
        let observed = Arc::new(Mutex::new(None));
        let reader = Arc::clone(&cell);
        let sink = Arc::clone(&observed);
        let _sub = cell.subscribe(move |_: &i32| *sink.lock().unwrap() = Some(reader.get()));

        cell.update(|v| *v += 5);

        assert_eq!(*observed.lock().unwrap(), Some(5));
    }
}
