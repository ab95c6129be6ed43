use crate::{Action, ReduceResult, Reducer, State, Subscriber};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum TestAction {
    Add(i32),
    Noop,
    /// CounterReducer returns an error
    Fail,
    /// CounterReducer panics
    Panic,
}

impl Action for TestAction {
    fn action_type(&self) -> &str {
        match self {
            TestAction::Add(_) => "ADD",
            TestAction::Noop => "NOOP",
            TestAction::Fail => "FAIL",
            TestAction::Panic => "PANIC",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("counter rejected the action")]
pub struct CounterError;

/// i32 slice starting at 0
pub struct CounterReducer;

impl Reducer<TestAction> for CounterReducer {
    type Slice = i32;

    fn initial_state(&self) -> i32 {
        0
    }

    fn reduce(&self, slice: &Arc<i32>, action: &TestAction) -> ReduceResult<i32> {
        match action {
            TestAction::Add(n) => Ok(Arc::new(**slice + n)),
            TestAction::Fail => Err(Box::new(CounterError)),
            TestAction::Panic => panic!("counter panicked on purpose"),
            TestAction::Noop => Ok(slice.clone()),
        }
    }
}

type ReduceFn<S> = dyn Fn(&Arc<S>, &TestAction) -> ReduceResult<S> + Send + Sync;

/// reducer with a replaceable reduce function, keeps its slice by default
#[derive(Clone)]
pub struct MockReducer<S>
where
    S: Clone + Send + Sync + 'static,
{
    initial: S,
    reduce_fn: Arc<ReduceFn<S>>,
    bootstrap_call_count: Arc<AtomicUsize>,
    reduce_call_count: Arc<AtomicUsize>,
}

impl<S> MockReducer<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            reduce_fn: Arc::new(|slice: &Arc<S>, _action: &TestAction| -> ReduceResult<S> {
                Ok(slice.clone())
            }),
            bootstrap_call_count: Arc::new(AtomicUsize::new(0)),
            reduce_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_reduce_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Arc<S>, &TestAction) -> ReduceResult<S> + Send + Sync + 'static,
    {
        self.reduce_fn = Arc::new(f);
        self
    }

    pub fn bootstrap_count(&self) -> usize {
        self.bootstrap_call_count.load(Ordering::SeqCst)
    }

    pub fn reduce_count(&self) -> usize {
        self.reduce_call_count.load(Ordering::SeqCst)
    }
}

impl<S> Reducer<TestAction> for MockReducer<S>
where
    S: Clone + Send + Sync + 'static,
{
    type Slice = S;

    fn initial_state(&self) -> S {
        self.initial.clone()
    }

    fn bootstrap(&self, initial: Option<Arc<S>>) -> ReduceResult<S> {
        self.bootstrap_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(initial.unwrap_or_else(|| Arc::new(self.initial_state())))
    }

    fn reduce(&self, slice: &Arc<S>, action: &TestAction) -> ReduceResult<S> {
        self.reduce_call_count.fetch_add(1, Ordering::SeqCst);
        (self.reduce_fn)(slice, action)
    }
}

/// records every notification
#[derive(Default)]
pub struct MockSubscriber {
    received: Mutex<Vec<(Arc<State>, TestAction)>>,
    notify_call_count: AtomicUsize,
    unsubscribed: AtomicBool,
    journal: Option<(&'static str, Arc<Mutex<Vec<&'static str>>>)>,
}

impl MockSubscriber {
    pub fn new() -> Self {
        Default::default()
    }

    /// write `tag` into `journal` on every notification
    pub fn with_journal(mut self, tag: &'static str, journal: Arc<Mutex<Vec<&'static str>>>) -> Self {
        self.journal = Some((tag, journal));
        self
    }

    pub fn notify_count(&self) -> usize {
        self.notify_call_count.load(Ordering::SeqCst)
    }

    pub fn was_unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::SeqCst)
    }

    pub fn states(&self) -> Vec<Arc<State>> {
        self.received.lock().unwrap().iter().map(|(state, _)| state.clone()).collect()
    }

    pub fn last_state(&self) -> Option<Arc<State>> {
        self.received.lock().unwrap().last().map(|(state, _)| state.clone())
    }
}

impl Subscriber<TestAction> for MockSubscriber {
    fn on_notify(&self, state: &Arc<State>, action: &TestAction) {
        self.notify_call_count.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push((state.clone(), action.clone()));
        if let Some((tag, journal)) = &self.journal {
            journal.lock().unwrap().push(*tag);
        }
    }

    fn on_unsubscribe(&self) {
        self.unsubscribed.store(true, Ordering::SeqCst);
    }
}
