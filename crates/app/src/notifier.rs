//! Notifier: in-process subscribe/broadcast primitive, one per observable
//! channel (auth state, current language, load error, …).
//!
//! Broadcasts are synchronous fan-outs over a snapshot of the listener list
//! taken when `notify` starts. A listener that panics is isolated and logged;
//! the remaining listeners of the same broadcast still run.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use lifeline_domain::error::ListenerError;
use lifeline_domain::id::SubscriptionId;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registration<T> {
    id: SubscriptionId,
    listener: Listener<T>,
}

type Registrations<T> = Mutex<Vec<Registration<T>>>;

/// Type-erased access to a channel's listener list, so [`Subscription`] does
/// not carry the channel's value type.
trait ListenerSlot: Send + Sync {
    fn remove(&self, id: SubscriptionId) -> bool;
}

impl<T> ListenerSlot for Registrations<T> {
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }
}

/// Handle returned by [`Notifier::subscribe`].
///
/// Dropping the handle does **not** unsubscribe; the listener stays
/// registered until [`unsubscribe`](Self::unsubscribe) is called or the
/// channel is dropped.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: SubscriptionId,
    slot: Weak<dyn ListenerSlot>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove exactly this registration.
    ///
    /// Returns `true` the first time; later calls are no-ops returning
    /// `false`, as is calling it after the channel was dropped.
    pub fn unsubscribe(&self) -> bool {
        self.slot
            .upgrade()
            .is_some_and(|slot| slot.remove(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Broadcast channel for values of type `T`.
pub struct Notifier<T> {
    channel: &'static str,
    registrations: Arc<Registrations<T>>,
}

impl<T: 'static> Notifier<T> {
    /// Create an empty channel. `channel` names it in logs.
    #[must_use]
    pub fn new(channel: &'static str) -> Self {
        Self {
            channel,
            registrations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn channel(&self) -> &'static str {
        self.channel
    }

    /// Append `listener`. The same closure may be subscribed several times;
    /// each registration is called once per broadcast.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.lock().push(Registration {
            id,
            listener: Arc::new(listener),
        });
        tracing::trace!(channel = self.channel, %id, "listener subscribed");

        let slot: Arc<dyn ListenerSlot> = self.registrations.clone();
        Subscription {
            id,
            slot: Arc::downgrade(&slot),
        }
    }

    /// Call every listener registered when this call starts, in subscription
    /// order.
    ///
    /// Returns the number of listeners that panicked; those failures are
    /// logged and never propagated.
    pub fn notify(&self, value: &T) -> usize {
        let snapshot: Vec<Listener<T>> = self
            .lock()
            .iter()
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        let mut failures = 0;
        for listener in snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(value))) {
                failures += 1;
                let err = ListenerError {
                    channel: self.channel,
                    message: panic_message(payload.as_ref()),
                };
                tracing::warn!(channel = self.channel, error = %err, "listener failed");
            }
        }
        failures
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration<T>>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> Notifier<T> {
    /// Subscribe through an async stream instead of a callback.
    ///
    /// Every broadcast value is cloned into an unbounded channel. The stream
    /// ends once the subscription is removed and the channel is dropped.
    pub fn stream(&self) -> (Subscription, UnboundedReceiverStream<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |value: &T| {
            // The receiver may be gone; that only means nobody listens anymore.
            let _ = tx.send(value.clone());
        });
        (subscription, UnboundedReceiverStream::new(rx))
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Notifier")
            .field("channel", &self.channel)
            .field("listeners", &listeners)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
