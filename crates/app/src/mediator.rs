//! Service mediator: drives registered services to readiness.
//!
//! Services register themselves while they are constructed; the bootstrap
//! driver then runs one batch with [`ServiceMediator::initialize_services`].
//!
//! Registration order **is** the dependency order: a batch awaits each
//! service's `initialize()` to completion before starting the next one, so a
//! service constructed after its dependencies (e.g. auth after the HTTP
//! client) always finds them ready or failed. A failure is captured in the
//! report and the batch moves on.
//!
//! A run that never returns is not left half-done: if the batch future is
//! dropped while a service is `Initializing`, that entry goes back to the
//! state it had before the run, and a panicking `initialize()` settles the
//! entry as `Failed`.
//!
//! Name lookups ([`state_of`](ServiceMediator::state_of),
//! [`reinitialize`](ServiceMediator::reinitialize)) resolve to the first
//! registration carrying that name; give services unique names.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use lifeline_domain::error::{InitializationError, LifelineError};
use lifeline_domain::lifecycle::ReadyState;
use lifeline_domain::report::{InitializationReport, ServiceOutcome, ServiceReport};
use lifeline_domain::time::{self, Timestamp};

use crate::ports::Initializable;

struct Entry {
    service: Arc<dyn Initializable>,
    state: ReadyState,
    settled: Option<ServiceReport>,
}

/// Ordered registry of [`Initializable`] services and their readiness.
pub struct ServiceMediator {
    entries: Mutex<Vec<Entry>>,
    // Serializes batch runs and explicit re-initializations.
    batch: tokio::sync::Mutex<()>,
}

impl Default for ServiceMediator {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMediator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            batch: tokio::sync::Mutex::new(()),
        }
    }

    /// Append `service` to the initialization order.
    ///
    /// Registering the same instance (same `Arc` allocation) again is a no-op
    /// and returns `false`. Distinct instances are always appended, even if
    /// they share a name.
    pub fn register_service_for_initialization(&self, service: Arc<dyn Initializable>) -> bool {
        let mut entries = self.lock();
        if entries
            .iter()
            .any(|entry| same_instance(&entry.service, &service))
        {
            tracing::debug!(service = service.name(), "service already registered");
            return false;
        }

        tracing::debug!(
            service = service.name(),
            position = entries.len(),
            "service registered for initialization"
        );
        entries.push(Entry {
            service,
            state: ReadyState::Uninitialized,
            settled: None,
        });
        true
    }

    /// Typed convenience over [`register_service_for_initialization`](Self::register_service_for_initialization).
    pub fn register<S: Initializable + 'static>(&self, service: &Arc<S>) -> bool {
        let service: Arc<dyn Initializable> = Arc::clone(service) as Arc<dyn Initializable>;
        self.register_service_for_initialization(service)
    }

    /// Initialize every `Uninitialized` service, in registration order, one
    /// at a time.
    ///
    /// Services that already settled in an earlier batch are not run again.
    /// The returned report lists every settled service in registration order.
    pub async fn initialize_services(&self) -> InitializationReport {
        let _batch = self.batch.lock().await;
        tracing::info!(services = self.len(), "initializing services");

        let mut index = 0;
        loop {
            let service = {
                let mut entries = self.lock();
                let Some(entry) = entries.get_mut(index) else {
                    break;
                };
                index += 1;
                if !entry.state.is_pending() {
                    continue;
                }
                entry.state = ReadyState::Initializing;
                Arc::clone(&entry.service)
            };
            self.run(service, ReadyState::Uninitialized).await;
        }

        let report = self.report();
        if report.is_all_ready() {
            tracing::info!(%report, "all services initialized");
        } else {
            tracing::warn!(%report, "some services failed to initialize");
        }
        report
    }

    /// Explicitly re-run `initialize()` for the first service named `name`.
    ///
    /// This is the only way out of `Failed`. A `Ready` service is left
    /// untouched and reported as ready; an `Uninitialized` one is run as a
    /// batch would. Returns `None` only for unknown names.
    pub async fn reinitialize(&self, name: &str) -> Option<ServiceOutcome> {
        let _batch = self.batch.lock().await;

        let (service, previous) = {
            let mut entries = self.lock();
            let entry = entries
                .iter_mut()
                .find(|entry| entry.service.name() == name)?;
            let previous = match entry.state {
                ReadyState::Ready => return Some(ServiceOutcome::Ready),
                // Runs hold the batch lock and reset their entry when dropped,
                // so nothing is in flight here.
                ReadyState::Initializing => ReadyState::Uninitialized,
                state => state,
            };
            entry.state = ReadyState::Initializing;
            (Arc::clone(&entry.service), previous)
        };

        tracing::info!(service = name, "re-initializing service");
        Some(self.run(service, previous).await)
    }

    /// Current state of the first service registered under `name`.
    ///
    /// A second instance sharing that name is not reachable through this
    /// lookup; use [`report`](Self::report) entries to see every one.
    #[must_use]
    pub fn state_of(&self, name: &str) -> Option<ReadyState> {
        self.lock()
            .iter()
            .find(|entry| entry.service.name() == name)
            .map(|entry| entry.state)
    }

    /// Names in registration order.
    #[must_use]
    pub fn registered_names(&self) -> Vec<&'static str> {
        self.lock().iter().map(|entry| entry.service.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of every settled service.
    #[must_use]
    pub fn report(&self) -> InitializationReport {
        InitializationReport::new(
            self.lock()
                .iter()
                .filter_map(|entry| entry.settled.clone())
                .collect(),
        )
    }

    async fn run(&self, service: Arc<dyn Initializable>, previous: ReadyState) -> ServiceOutcome {
        let name = service.name();
        let started_at = time::now();
        tracing::debug!(service = name, "initializing service");

        let mut in_flight = InFlight {
            mediator: self,
            service: Arc::clone(&service),
            previous,
            started_at,
            armed: true,
        };
        let result = service.initialize().await;
        in_flight.armed = false;

        let finished_at = time::now();
        let elapsed_ms = time::elapsed_ms(started_at, finished_at);
        let outcome = match result {
            Ok(()) => {
                tracing::info!(service = name, elapsed_ms, "service ready");
                ServiceOutcome::Ready
            }
            Err(err) => {
                let err = InitializationError::new(name, err);
                tracing::warn!(
                    service = name,
                    elapsed_ms,
                    error = %err,
                    cause = %err.root_cause(),
                    "service failed to initialize, continuing"
                );
                ServiceOutcome::Failed(err)
            }
        };

        self.settle(&service, outcome.clone(), started_at, finished_at);
        outcome
    }

    fn settle(
        &self,
        service: &Arc<dyn Initializable>,
        outcome: ServiceOutcome,
        started_at: Timestamp,
        finished_at: Timestamp,
    ) {
        let mut entries = self.lock();
        if let Some(entry) = entries
            .iter_mut()
            .find(|entry| same_instance(&entry.service, service))
        {
            entry.state = outcome.state();
            entry.settled = Some(ServiceReport {
                service: service.name(),
                outcome,
                started_at,
                finished_at,
            });
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn same_instance(a: &Arc<dyn Initializable>, b: &Arc<dyn Initializable>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Settles an entry whose `initialize()` did not return: `Failed` when it
/// panicked, back to its previous state when the run was dropped.
struct InFlight<'a> {
    mediator: &'a ServiceMediator,
    service: Arc<dyn Initializable>,
    previous: ReadyState,
    started_at: Timestamp,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let name = self.service.name();
        if thread::panicking() {
            tracing::error!(service = name, "service panicked during initialization");
            let err = InitializationError::new(name, LifelineError::Panicked);
            self.mediator.settle(
                &self.service,
                ServiceOutcome::Failed(err),
                self.started_at,
                time::now(),
            );
            return;
        }

        tracing::warn!(service = name, previous = %self.previous, "initialization cancelled");
        if let Some(entry) = self
            .mediator
            .lock()
            .iter_mut()
            .find(|entry| same_instance(&entry.service, &self.service))
        {
            entry.state = self.previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    struct FakeService {
        name: &'static str,
        log: Log,
        failure: Mutex<Option<&'static str>>,
        calls: AtomicUsize,
    }

    impl FakeService {
        fn ok(name: &'static str, log: &Log) -> Arc<Self> {
            Arc::new(Self {
                name,
                log: Arc::clone(log),
                failure: Mutex::new(None),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str, cause: &'static str, log: &Log) -> Arc<Self> {
            let service = Self::ok(name, log);
            *service.failure.lock().unwrap() = Some(cause);
            service
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn heal(&self) {
            *self.failure.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl Initializable for FakeService {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn initialize(&self) -> Result<(), LifelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("{}:start", self.name));
            tokio::task::yield_now().await;
            self.log.lock().unwrap().push(format!("{}:end", self.name));
            let failure = *self.failure.lock().unwrap();
            match failure {
                Some(cause) => Err(LifelineError::storage(cause)),
                None => Ok(()),
            }
        }
    }

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn should_initialize_in_registration_order_without_overlap() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        for name in ["s1", "s2", "s3"] {
            mediator.register(&FakeService::ok(name, &log));
        }

        mediator.initialize_services().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["s1:start", "s1:end", "s2:start", "s2:end", "s3:start", "s3:end"]
        );
    }

    #[tokio::test]
    async fn should_continue_after_failure_and_report_cause() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let a = FakeService::ok("a", &log);
        let b = FakeService::failing("b", "boom", &log);
        let c = FakeService::ok("c", &log);
        mediator.register(&a);
        mediator.register(&b);
        mediator.register(&c);

        let report = mediator.initialize_services().await;

        assert_eq!(c.calls(), 1);
        assert!(report.outcome("a").unwrap().is_ready());
        assert!(report.outcome("c").unwrap().is_ready());
        let failure = report.outcome("b").unwrap().error().unwrap();
        assert_eq!(failure.service, "b");
        assert_eq!(failure.root_cause(), "boom");
        assert_eq!(report.services().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(mediator.state_of("b"), Some(ReadyState::Failed));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"]
        );
    }

    #[tokio::test]
    async fn should_deduplicate_same_instance() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let service = FakeService::ok("dup", &log);

        assert!(mediator.register(&service));
        assert!(!mediator.register(&service));

        assert_eq!(mediator.len(), 1);
    }

    #[tokio::test]
    async fn should_keep_distinct_instances_with_same_name() {
        let log = new_log();
        let mediator = ServiceMediator::new();

        assert!(mediator.register(&FakeService::ok("twin", &log)));
        assert!(mediator.register(&FakeService::ok("twin", &log)));

        assert_eq!(mediator.registered_names(), vec!["twin", "twin"]);
    }

    #[tokio::test]
    async fn should_not_rerun_settled_services() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let ok = FakeService::ok("ok", &log);
        let bad = FakeService::failing("bad", "nope", &log);
        mediator.register(&ok);
        mediator.register(&bad);

        mediator.initialize_services().await;
        let second = mediator.initialize_services().await;

        assert_eq!(ok.calls(), 1);
        assert_eq!(bad.calls(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second.failed_count(), 1);
    }

    #[tokio::test]
    async fn should_run_late_registrations_in_next_batch() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let early = FakeService::ok("early", &log);
        mediator.register(&early);
        mediator.initialize_services().await;

        let late = FakeService::ok("late", &log);
        mediator.register(&late);
        assert_eq!(mediator.state_of("late"), Some(ReadyState::Uninitialized));

        let report = mediator.initialize_services().await;

        assert_eq!(early.calls(), 1);
        assert_eq!(late.calls(), 1);
        assert!(report.is_all_ready());
    }

    #[tokio::test]
    async fn should_serialize_concurrent_batches() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let service = FakeService::ok("once", &log);
        mediator.register(&service);

        let (first, second) = tokio::join!(
            mediator.initialize_services(),
            mediator.initialize_services()
        );

        assert_eq!(service.calls(), 1);
        assert!(first.is_all_ready());
        assert!(second.is_all_ready());
    }

    #[tokio::test]
    async fn should_recover_failed_service_on_explicit_reinitialize() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let flaky = FakeService::failing("flaky", "offline", &log);
        mediator.register(&flaky);
        mediator.initialize_services().await;

        flaky.heal();
        let outcome = mediator.reinitialize("flaky").await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(flaky.calls(), 2);
        assert_eq!(mediator.state_of("flaky"), Some(ReadyState::Ready));
        assert!(mediator.report().is_all_ready());
    }

    #[tokio::test]
    async fn should_not_rerun_ready_service_on_reinitialize() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let service = FakeService::ok("steady", &log);
        mediator.register(&service);
        mediator.initialize_services().await;

        let outcome = mediator.reinitialize("steady").await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn should_return_none_when_reinitializing_unknown_service() {
        let mediator = ServiceMediator::new();
        assert!(mediator.reinitialize("ghost").await.is_none());
    }

    #[tokio::test]
    async fn should_return_empty_report_without_registrations() {
        let mediator = ServiceMediator::new();
        let report = mediator.initialize_services().await;
        assert!(report.is_empty());
        assert!(mediator.is_empty());
    }

    #[tokio::test]
    async fn should_mark_service_initializing_while_it_runs() {
        struct Watcher {
            mediator: Arc<ServiceMediator>,
            seen: Mutex<Option<ReadyState>>,
            done: AtomicBool,
        }

        #[async_trait]
        impl Initializable for Watcher {
            fn name(&self) -> &'static str {
                "watcher"
            }

            async fn initialize(&self) -> Result<(), LifelineError> {
                *self.seen.lock().unwrap() = self.mediator.state_of("watcher");
                self.done.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let mediator = Arc::new(ServiceMediator::new());
        let watcher = Arc::new(Watcher {
            mediator: Arc::clone(&mediator),
            seen: Mutex::new(None),
            done: AtomicBool::new(false),
        });
        mediator.register(&watcher);

        mediator.initialize_services().await;

        assert!(watcher.done.load(Ordering::SeqCst));
        assert_eq!(*watcher.seen.lock().unwrap(), Some(ReadyState::Initializing));
        assert_eq!(mediator.state_of("watcher"), Some(ReadyState::Ready));
    }

    /// Never finishes its first `initialize()`; later calls succeed.
    struct Stalling {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Initializable for Stalling {
        fn name(&self) -> &'static str {
            "stalling"
        }

        async fn initialize(&self) -> Result<(), LifelineError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    struct Exploding;

    #[async_trait]
    impl Initializable for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        async fn initialize(&self) -> Result<(), LifelineError> {
            panic!("exploded");
        }
    }

    #[tokio::test]
    async fn should_reset_service_when_batch_is_cancelled() {
        let mediator = ServiceMediator::new();
        let stalling = Arc::new(Stalling {
            calls: AtomicUsize::new(0),
        });
        mediator.register(&stalling);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), mediator.initialize_services()).await;
        assert!(cancelled.is_err());
        assert_eq!(
            mediator.state_of("stalling"),
            Some(ReadyState::Uninitialized)
        );

        let report = mediator.initialize_services().await;

        assert_eq!(stalling.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.len(), 1);
        assert!(report.is_all_ready());
        assert_eq!(mediator.state_of("stalling"), Some(ReadyState::Ready));
    }

    #[tokio::test]
    async fn should_run_cancelled_service_on_reinitialize() {
        let mediator = ServiceMediator::new();
        let stalling = Arc::new(Stalling {
            calls: AtomicUsize::new(0),
        });
        mediator.register(&stalling);
        let _ =
            tokio::time::timeout(Duration::from_millis(10), mediator.initialize_services()).await;

        let outcome = mediator.reinitialize("stalling").await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(stalling.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_keep_failed_state_when_reinitialize_is_cancelled() {
        struct FailsThenStalls {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl Initializable for FailsThenStalls {
            fn name(&self) -> &'static str {
                "fails-then-stalls"
            }

            async fn initialize(&self) -> Result<(), LifelineError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(LifelineError::storage("disk full"));
                }
                std::future::pending::<()>().await;
                Ok(())
            }
        }

        let mediator = ServiceMediator::new();
        mediator.register(&Arc::new(FailsThenStalls {
            calls: AtomicUsize::new(0),
        }));
        mediator.initialize_services().await;

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            mediator.reinitialize("fails-then-stalls"),
        )
        .await;

        assert!(cancelled.is_err());
        assert_eq!(
            mediator.state_of("fails-then-stalls"),
            Some(ReadyState::Failed)
        );
        assert_eq!(mediator.report().failed_count(), 1);
    }

    #[tokio::test]
    async fn should_settle_panicking_service_as_failed() {
        let log = new_log();
        let mediator = Arc::new(ServiceMediator::new());
        mediator.register(&Arc::new(Exploding));
        let after = FakeService::ok("after", &log);
        mediator.register(&after);

        let batch = {
            let mediator = Arc::clone(&mediator);
            tokio::spawn(async move { mediator.initialize_services().await })
        };
        assert!(batch.await.unwrap_err().is_panic());
        assert_eq!(mediator.state_of("exploding"), Some(ReadyState::Failed));
        assert_eq!(mediator.state_of("after"), Some(ReadyState::Uninitialized));

        let report = mediator.initialize_services().await;

        assert_eq!(after.calls(), 1);
        assert_eq!(report.services().collect::<Vec<_>>(), vec!["exploding", "after"]);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.service, "exploding");
        assert!(matches!(failure.source.as_ref(), LifelineError::Panicked));
    }

    #[tokio::test]
    async fn should_resolve_shared_name_to_first_registration() {
        let log = new_log();
        let mediator = ServiceMediator::new();
        let first = FakeService::failing("twin", "first", &log);
        let second = FakeService::ok("twin", &log);
        mediator.register(&first);
        mediator.register(&second);

        let report = mediator.initialize_services().await;

        assert_eq!(mediator.state_of("twin"), Some(ReadyState::Failed));
        assert!(report.outcome("twin").unwrap().error().is_some());
        // The second instance is only visible through the entries.
        assert!(report.entries()[1].outcome.is_ready());
    }
}
