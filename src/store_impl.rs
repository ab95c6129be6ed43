use crate::metrics::{CountMetrics, Metrics, MetricsSnapshot};
use crate::store::{Store, StoreError, DEFAULT_STORE_NAME};
use crate::subscriber::SubscriberWithId;
use crate::{Action, FnSubscriber, InitialState, ReducerRegistry, State, Subscriber, Subscription};
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};
use std::time::Instant;

// the state is replaced by a single assignment, so a poisoned lock still guards a consistent value
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// marks the current thread as the dispatching one until dropped
///
/// actions still queued when the guard drops belong to a dispatch that unwound,
/// they are discarded so the next dispatch does not reduce them
struct DispatchingGuard<'a, A>
where
    A: Action,
{
    store_name: &'a str,
    owner: &'a Mutex<Option<ThreadId>>,
    pending: &'a Receiver<A>,
}

impl<'a, A> DispatchingGuard<'a, A>
where
    A: Action,
{
    fn enter(
        store_name: &'a str,
        owner: &'a Mutex<Option<ThreadId>>,
        pending: &'a Receiver<A>,
        thread_id: ThreadId,
    ) -> Self {
        *lock(owner) = Some(thread_id);
        Self {
            store_name,
            owner,
            pending,
        }
    }
}

impl<A> Drop for DispatchingGuard<'_, A>
where
    A: Action,
{
    fn drop(&mut self) {
        for orphan in self.pending.try_iter() {
            warn!(
                "store '{}': discarding queued '{}', its dispatch did not complete",
                self.store_name,
                orphan.action_type()
            );
        }
        *lock(self.owner) = None;
    }
}

/// StoreImpl is the default implementation of a slice store.
///
/// Dispatches run synchronously on the calling thread. Dispatches from other threads
/// wait for the running one, a dispatch issued from a reducer or subscriber of the
/// running dispatch is queued and reduced once the running dispatch has notified its subscribers.
///
/// ## Caution
/// [`StoreImpl`] is the default implementation of the [`Store`] trait, and its interface can be changed in the future.
/// [`Store`] is the stable interface for the store that user code should depend on.
pub struct StoreImpl<A>
where
    A: Action,
{
    pub(crate) name: String,
    registry: ReducerRegistry<A>,
    state: Mutex<Arc<State>>,
    pub(crate) subscribers: Arc<Mutex<Vec<SubscriberWithId<A>>>>,
    next_subscriber_id: AtomicU64,
    pending_tx: Sender<A>,
    pending_rx: Receiver<A>,
    dispatch_lock: Mutex<()>,
    dispatching: Mutex<Option<ThreadId>>,
    disposed: AtomicBool,
    pub(crate) metrics: Arc<CountMetrics>,
    observer: Option<Arc<dyn Metrics>>,
}

/// Subscription for a subscriber
/// the subscriber can use it to unsubscribe from the store
struct SubscriberSubscription<A>
where
    A: Action,
{
    subscriber_id: u64,
    subscribers: Weak<Mutex<Vec<SubscriberWithId<A>>>>,
}

impl<A> Subscription for SubscriberSubscription<A>
where
    A: Action,
{
    fn unsubscribe(&self) {
        let Some(subscribers) = self.subscribers.upgrade() else {
            return;
        };
        let removed = {
            let mut subscribers = lock(&subscribers);
            subscribers
                .iter()
                .position(|s| s.id == self.subscriber_id)
                .map(|index| subscribers.remove(index))
        };
        if let Some(removed) = removed {
            removed.on_unsubscribe();
        }
    }
}

impl<A> StoreImpl<A>
where
    A: Action,
{
    /// create a new store with the reducers' initial states
    pub fn new(registry: ReducerRegistry<A>) -> Result<Arc<StoreImpl<A>>, StoreError> {
        Self::new_with(DEFAULT_STORE_NAME.into(), registry, InitialState::new())
    }

    /// create a new store, slices named in `initial` start from the given values
    pub fn new_with_initial(
        registry: ReducerRegistry<A>,
        initial: InitialState,
    ) -> Result<Arc<StoreImpl<A>>, StoreError> {
        Self::new_with(DEFAULT_STORE_NAME.into(), registry, initial)
    }

    /// create a new store
    pub fn new_with(
        name: String,
        registry: ReducerRegistry<A>,
        initial: InitialState,
    ) -> Result<Arc<StoreImpl<A>>, StoreError> {
        Self::new_with_metrics(name, registry, initial, None)
    }

    /// create a new store, `observer` receives every metrics event next to the built-in counters
    pub fn new_with_metrics(
        name: String,
        registry: ReducerRegistry<A>,
        initial: InitialState,
        observer: Option<Arc<dyn Metrics>>,
    ) -> Result<Arc<StoreImpl<A>>, StoreError> {
        if name.is_empty() {
            return Err(StoreError::ConfigurationError(
                "store name is empty".to_string(),
            ));
        }

        let state = match registry.initial_state(initial) {
            Ok(state) => state,
            Err(e) => {
                error!("store '{}': construction failed: {}", name, e);
                return Err(e);
            }
        };
        let (pending_tx, pending_rx) = channel::unbounded();

        info!(
            "store '{}': created with slices {:?}",
            name,
            registry.names().collect::<Vec<_>>()
        );

        Ok(Arc::new(StoreImpl {
            name,
            registry,
            state: Mutex::new(Arc::new(state)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber_id: AtomicU64::new(0),
            pending_tx,
            pending_rx,
            dispatch_lock: Mutex::new(()),
            dispatching: Mutex::new(None),
            disposed: AtomicBool::new(false),
            metrics: Arc::new(CountMetrics::default()),
            observer,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// get the current state
    ///
    /// the same `Arc` is returned until the next successful dispatch
    pub fn get_state(&self) -> Arc<State> {
        lock(&self.state).clone()
    }

    /// get the metrics
    pub fn get_metrics(&self) -> MetricsSnapshot {
        (&*self.metrics).into()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn record(&self, event: impl Fn(&dyn Metrics)) {
        event(&*self.metrics);
        if let Some(observer) = self.observer.as_deref() {
            event(observer);
        }
    }

    fn ensure_active(&self) -> Result<(), StoreError> {
        if self.is_disposed() {
            return Err(StoreError::StoreDisposedError(self.name.clone()));
        }
        Ok(())
    }

    /// add a subscriber to the store
    ///
    /// the same subscriber may be added more than once, it is then notified once per registration
    pub fn subscribe(
        &self,
        subscriber: Arc<dyn Subscriber<A> + Send + Sync>,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut subscribers = lock(&self.subscribers);
            // checked under the lock so a concurrent dispose cannot miss this registration
            self.ensure_active()?;
            subscribers.push(SubscriberWithId::new(subscriber_id, subscriber));
        }
        debug!("store '{}': subscriber {} added", self.name, subscriber_id);

        Ok(Box::new(SubscriberSubscription {
            subscriber_id,
            subscribers: Arc::downgrade(&self.subscribers),
        }))
    }

    /// add a function as a subscriber
    pub fn subscribe_fn<F>(&self, func: F) -> Result<Box<dyn Subscription>, StoreError>
    where
        F: Fn(&Arc<State>, &A) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnSubscriber::from(func)))
    }

    /// remove the first registration of `subscriber`
    pub fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber<A> + Send + Sync>) -> bool {
        let removed = {
            let mut subscribers = lock(&self.subscribers);
            subscribers
                .iter()
                .position(|s| s.is(subscriber))
                .map(|index| subscribers.remove(index))
        };
        match removed {
            Some(removed) => {
                debug!("store '{}': subscriber {} removed", self.name, removed.id);
                removed.on_unsubscribe();
                true
            }
            None => false,
        }
    }

    /// dispatch an action
    ///
    /// ### Return
    /// * Ok(()) : the action and everything it queued were reduced
    /// * Err(StoreError) : the action, or an action queued while dispatching it, failed.
    ///   a failed action leaves the state untouched and notifies nobody
    pub fn dispatch(&self, action: A) -> Result<(), StoreError> {
        self.ensure_active()?;
        self.record(|m| m.action_dispatched(action.action_type()));

        let current_thread = thread::current().id();
        let nested = *lock(&self.dispatching) == Some(current_thread);
        if nested {
            debug!(
                "store '{}': queueing nested dispatch of '{}'",
                self.name,
                action.action_type()
            );
            self.record(|m| m.action_queued(action.action_type()));
            // the receiver lives as long as `self`, so sending cannot fail
            if let Err(e) = self.pending_tx.send(action) {
                error!(
                    "store '{}': failed to queue '{}'",
                    self.name,
                    e.into_inner().action_type()
                );
            }
            return Ok(());
        }

        let _serial = lock(&self.dispatch_lock);
        let _dispatching =
            DispatchingGuard::enter(&self.name, &self.dispatching, &self.pending_rx, current_thread);

        let mut result = self.do_reduce(&action);
        while let Ok(queued) = self.pending_rx.try_recv() {
            if self.is_disposed() {
                warn!(
                    "store '{}': dropping queued '{}', store is disposed",
                    self.name,
                    queued.action_type()
                );
                continue;
            }
            if let Err(e) = self.do_reduce(&queued) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    fn do_reduce(&self, action: &A) -> Result<(), StoreError> {
        let started_at = Instant::now();
        let current = self.get_state();

        let next = match self.registry.combine(&current, action) {
            Ok(next) => Arc::new(next),
            Err(e) => {
                error!(
                    "store '{}': dispatch of '{}' abandoned: {}",
                    self.name,
                    action.action_type(),
                    e
                );
                self.record(|m| m.error_occurred(&e));
                return Err(e);
            }
        };

        *lock(&self.state) = next.clone();
        let reduce_duration = started_at.elapsed();
        self.record(|m| m.action_reduced(action.action_type(), reduce_duration));
        trace!(
            "store '{}': reduced '{}' in {:?}",
            self.name,
            action.action_type(),
            started_at.elapsed()
        );

        self.do_notify(&next, action);
        Ok(())
    }

    fn do_notify(&self, next_state: &Arc<State>, action: &A) {
        let notify_start = Instant::now();
        let subscribers = lock(&self.subscribers).clone();

        let mut notified = 0;
        for subscriber_with_id in subscribers.iter() {
            if self.is_disposed() {
                break;
            }
            subscriber_with_id.on_notify(next_state, action);
            notified += 1;
        }

        let notify_duration = notify_start.elapsed();
        self.record(|m| m.subscriber_notified(action.action_type(), notified, notify_duration));
    }

    /// clear all subscribers
    pub(crate) fn clear_subscribers(&self) {
        let removed: Vec<_> = lock(&self.subscribers).drain(..).collect();
        debug!("store '{}': {} subscribers cleared", self.name, removed.len());
        for subscriber_with_id in removed.iter() {
            subscriber_with_id.on_unsubscribe();
        }
    }

    /// dispose the store
    ///
    /// all subscribers are removed, `dispatch` and `subscribe` fail afterwards.
    /// calling it again does nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.clear_subscribers();
        info!("store '{}': disposed", self.name);
    }
}

/// release subscribers when the store is dropped without being disposed
impl<A> Drop for StoreImpl<A>
where
    A: Action,
{
    fn drop(&mut self) {
        if !self.is_disposed() {
            self.clear_subscribers();
        }
        debug!("store '{}': dropped", self.name);
    }
}

impl<A> Store<A> for StoreImpl<A>
where
    A: Action,
{
    fn get_state(&self) -> Arc<State> {
        self.get_state()
    }

    fn dispatch(&self, action: A) -> Result<(), StoreError> {
        self.dispatch(action)
    }

    fn subscribe(
        &self,
        subscriber: Arc<dyn Subscriber<A> + Send + Sync>,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        self.subscribe(subscriber)
    }

    fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber<A> + Send + Sync>) -> bool {
        self.unsubscribe(subscriber)
    }

    fn dispose(&self) {
        self.dispose()
    }

    fn is_disposed(&self) -> bool {
        self.is_disposed()
    }
}
