//! Singleton registry: one lazily constructed instance per service type.
//!
//! Instances are keyed by [`TypeId`] and built on first access by the factory
//! provided for that type. Factories receive the registry so they can resolve
//! their own dependencies; a factory that asks for its own type before it has
//! finished fails with [`RegistryError::ReentrantConstruction`] instead of
//! recursing forever.
//!
//! ## Lifecycle
//! - **init**: the process-wide registry ([`SingletonRegistry::global`]) is
//!   created on first access; each instance is created on its first
//!   [`get_instance`](SingletonRegistry::get_instance).
//! - **reset**: [`reset`](SingletonRegistry::reset) and
//!   [`clear`](SingletonRegistry::clear) drop cached instances. They exist for
//!   test harnesses; production code never tears singletons down.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use lifeline_domain::error::{LifelineError, RegistryError};

use crate::mediator::ServiceMediator;
use crate::ports::Initializable;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&SingletonRegistry) -> Result<Instance, LifelineError> + Send + Sync>;

enum Slot {
    /// A factory is running on this thread.
    Constructing(ThreadId),
    Ready(Instance),
}

#[derive(Default)]
struct State {
    slots: HashMap<TypeId, Slot>,
    factories: HashMap<TypeId, Factory>,
}

/// Per-type instance cache.
pub struct SingletonRegistry {
    state: Mutex<State>,
    constructed: Condvar,
}

static GLOBAL: OnceLock<SingletonRegistry> = OnceLock::new();

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SingletonRegistry {
    /// Create an isolated registry.
    ///
    /// A [`ServiceMediator`] factory is pre-installed so services provided
    /// through [`provide_service`](Self::provide_service) have somewhere to
    /// register.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            state: Mutex::new(State::default()),
            constructed: Condvar::new(),
        };
        registry.provide(|_| Ok(ServiceMediator::new()));
        registry
    }

    /// The process-wide registry.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Provide the lazy factory for `T`.
    ///
    /// Replacing a factory does not affect an instance that was already
    /// constructed; call [`reset`](Self::reset) first for that.
    pub fn provide<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Self) -> Result<T, LifelineError> + Send + Sync + 'static,
    {
        self.install::<T>(Arc::new(move |registry: &Self| {
            factory(registry).map(|value| Arc::new(value) as Instance)
        }));
    }

    /// Provide the factory for a service that registers itself with the
    /// registry's [`ServiceMediator`] as soon as it is constructed.
    pub fn provide_service<T, F>(&self, factory: F)
    where
        T: Initializable + 'static,
        F: Fn(&Self) -> Result<T, LifelineError> + Send + Sync + 'static,
    {
        self.install::<T>(Arc::new(move |registry: &Self| {
            let service = Arc::new(factory(registry)?);
            registry.get_instance::<ServiceMediator>()?.register(&service);
            Ok(service as Instance)
        }));
    }

    /// Return the one instance of `T`, constructing it on first call.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingFactory`] when nothing was provided for `T`
    /// - [`RegistryError::ReentrantConstruction`] when called from inside
    ///   `T`'s own factory
    /// - whatever the factory returns; a failed construction is not cached
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, LifelineError> {
        let key = TypeId::of::<T>();
        let current = thread::current().id();

        let factory = {
            let mut state = self.lock();
            loop {
                let owner = match state.slots.get(&key) {
                    Some(Slot::Ready(instance)) => return downcast(Arc::clone(instance)),
                    Some(Slot::Constructing(owner)) => *owner,
                    None => break,
                };
                if owner == current {
                    return Err(RegistryError::ReentrantConstruction {
                        type_name: type_name::<T>(),
                    }
                    .into());
                }
                // Another thread is building it; wait for the outcome.
                state = self
                    .constructed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }

            let Some(factory) = state.factories.get(&key).map(Arc::clone) else {
                return Err(RegistryError::MissingFactory {
                    type_name: type_name::<T>(),
                }
                .into());
            };
            state.slots.insert(key, Slot::Constructing(current));
            factory
        };

        tracing::debug!(type_name = type_name::<T>(), "constructing singleton");
        let mut pending = Pending {
            registry: self,
            key,
            armed: true,
        };
        let instance = factory(self)?;

        self.lock()
            .slots
            .insert(key, Slot::Ready(Arc::clone(&instance)));
        pending.armed = false;
        self.constructed.notify_all();
        downcast(instance)
    }

    /// Whether an instance of `T` is cached.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        matches!(
            self.lock().slots.get(&TypeId::of::<T>()),
            Some(Slot::Ready(_))
        )
    }

    /// Drop the cached instance of `T`; the next access constructs a new one.
    /// Holders of the old `Arc` keep it alive. Test harnesses only.
    pub fn reset<T: 'static>(&self) -> bool {
        let mut state = self.lock();
        let key = TypeId::of::<T>();
        if matches!(state.slots.get(&key), Some(Slot::Ready(_))) {
            state.slots.remove(&key);
            true
        } else {
            false
        }
    }

    /// Drop every cached instance, keeping the factories. Test harnesses only.
    pub fn clear(&self) {
        self.lock()
            .slots
            .retain(|_, slot| matches!(slot, Slot::Constructing(_)));
    }

    fn install<T: 'static>(&self, factory: Factory) {
        let mut state = self.lock();
        if state.slots.contains_key(&TypeId::of::<T>()) {
            tracing::warn!(
                type_name = type_name::<T>(),
                "factory replaced after construction, cached instance kept"
            );
        }
        state.factories.insert(TypeId::of::<T>(), factory);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SingletonRegistry")
            .field("instances", &state.slots.len())
            .field("factories", &state.factories.len())
            .finish()
    }
}

/// Clears the `Constructing` marker if the factory fails or panics.
struct Pending<'a> {
    registry: &'a SingletonRegistry,
    key: TypeId,
    armed: bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.lock().slots.remove(&self.key);
            self.registry.constructed.notify_all();
        }
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Result<Arc<T>, LifelineError> {
    instance.downcast::<T>().map_err(|_| {
        RegistryError::TypeMismatch {
            type_name: type_name::<T>(),
        }
        .into()
    })
}
